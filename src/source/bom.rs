//! Maven BOM reader
//!
//! Reads `<dependency>` blocks of a bill of materials. When the document has
//! a `<dependencyManagement>` section only that section is read. Versions of
//! the form `${name}` are substituted from `<properties>`; `${project.version}`
//! refers to the version of the BOM itself.
//!
//! Format example:
//! ```text
//! <project>
//!   <version>5.1.0</version>
//!   <properties>
//!     <jackson.version>2.17.1</jackson.version>
//!   </properties>
//!   <dependencyManagement>
//!     <dependencies>
//!       <dependency>
//!         <groupId>com.fasterxml.jackson.core</groupId>
//!         <artifactId>jackson-databind</artifactId>
//!         <version>${jackson.version}</version>
//!       </dependency>
//!     </dependencies>
//!   </dependencyManagement>
//! </project>
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use regex::Regex;
use tracing::debug;

use crate::source::traits::{LoadOnce, RecommendationSource, SourceError, line_of, read_source};
use crate::source::types::{ArtifactKey, Recommendations, SourceKind};

/// Properties may refer to other properties up to this depth
const MAX_PROPERTY_DEPTH: usize = 8;

/// Source reading a Maven bill of materials
pub struct BomSource {
    path: PathBuf,
    loaded: LoadOnce,
    management_re: Regex,
    dependency_re: Regex,
    properties_re: Regex,
    property_re: Regex,
    /// Sections removed before looking for the project's own `<version>`
    nested_sections_re: Regex,
    version_re: Regex,
    group_re: Regex,
    artifact_re: Regex,
    reference_re: Regex,
}

impl BomSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: LoadOnce::default(),
            management_re: Regex::new(r"(?s)<dependencyManagement>(.*?)</dependencyManagement>")
                .unwrap(),
            dependency_re: Regex::new(r"(?s)<dependency>(.*?)</dependency>").unwrap(),
            properties_re: Regex::new(r"(?s)<properties>(.*?)</properties>").unwrap(),
            property_re: Regex::new(r"<([\w.\-]+)>\s*([^<]*?)\s*</([\w.\-]+)>").unwrap(),
            nested_sections_re: Regex::new(
                r"(?s)<parent>.*?</parent>|<dependencyManagement>.*?</dependencyManagement>|<dependencies>.*?</dependencies>|<properties>.*?</properties>|<build>.*?</build>|<plugins>.*?</plugins>",
            )
            .unwrap(),
            version_re: Regex::new(r"<version>\s*([^<]*?)\s*</version>").unwrap(),
            group_re: Regex::new(r"<groupId>\s*([^<]*?)\s*</groupId>").unwrap(),
            artifact_re: Regex::new(r"<artifactId>\s*([^<]*?)\s*</artifactId>").unwrap(),
            reference_re: Regex::new(r"\$\{([^}]+)\}").unwrap(),
        }
    }

    fn properties(&self, content: &str) -> HashMap<String, String> {
        let mut properties = HashMap::new();

        for section in self.properties_re.captures_iter(content) {
            for caps in self.property_re.captures_iter(section.get(1).unwrap().as_str()) {
                let (open, close) = (caps.get(1).unwrap().as_str(), caps.get(3).unwrap().as_str());
                if open == close {
                    properties.insert(open.to_string(), caps.get(2).unwrap().as_str().to_string());
                }
            }
        }

        let outer = self.nested_sections_re.replace_all(content, "");
        if let Some(caps) = self.version_re.captures(&outer) {
            let version = caps.get(1).unwrap().as_str().to_string();
            properties.insert("project.version".to_string(), version.clone());
            properties.insert("version".to_string(), version);
        }

        properties
    }

    fn substitute(
        &self,
        value: &str,
        properties: &HashMap<String, String>,
        origin: &str,
    ) -> Result<String, SourceError> {
        let mut current = value.to_string();

        for _ in 0..MAX_PROPERTY_DEPTH {
            let Some(caps) = self.reference_re.captures(&current) else {
                return Ok(current);
            };

            let property = caps.get(1).unwrap().as_str();
            let replacement =
                properties
                    .get(property)
                    .ok_or_else(|| SourceError::UnresolvedProperty {
                        origin: origin.to_string(),
                        property: property.to_string(),
                    })?;

            current = current.replacen(caps.get(0).unwrap().as_str(), replacement, 1);
        }

        match self.reference_re.captures(&current) {
            Some(caps) => Err(SourceError::UnresolvedProperty {
                origin: origin.to_string(),
                property: caps.get(1).unwrap().as_str().to_string(),
            }),
            None => Ok(current),
        }
    }

    /// Parse BOM content into recommendations
    pub fn parse(&self, content: &str, origin: &str) -> Result<Recommendations, SourceError> {
        let properties = self.properties(content);

        let (section, section_offset) = match self.management_re.captures(content) {
            Some(caps) => {
                let section = caps.get(1).unwrap();
                (section.as_str(), section.start())
            }
            None => (content, 0),
        };

        let mut recommendations = Recommendations::new();

        for caps in self.dependency_re.captures_iter(section) {
            let block = caps.get(1).unwrap().as_str();
            let line = line_of(content, section_offset + caps.get(0).unwrap().start());

            let group = self.group_re.captures(block).map(|c| c.get(1).unwrap().as_str());
            let artifact = self
                .artifact_re
                .captures(block)
                .map(|c| c.get(1).unwrap().as_str());

            let (Some(group), Some(artifact)) = (group, artifact) else {
                return Err(SourceError::InvalidSyntax {
                    origin: origin.to_string(),
                    line,
                    message: "dependency without groupId or artifactId".to_string(),
                });
            };

            let Some(version) = self
                .version_re
                .captures(block)
                .map(|c| c.get(1).unwrap().as_str())
                .filter(|v| !v.is_empty())
            else {
                debug!("Skipping {}:{} without version in {}", group, artifact, origin);
                continue;
            };

            let group = self.substitute(group, &properties, origin)?;
            let artifact = self.substitute(artifact, &properties, origin)?;
            let version = self.substitute(version, &properties, origin)?;

            recommendations.insert(ArtifactKey::new(group, artifact), version);
        }

        Ok(recommendations)
    }
}

impl RecommendationSource for BomSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Bom
    }

    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    fn recommendations(&self) -> Result<&Recommendations, SourceError> {
        self.loaded.get_or_load(|| {
            let content = read_source(&self.path)?;
            self.parse(&content, &self.origin())
        })
    }
}
