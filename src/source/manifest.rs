//! Dependency descriptor (ivy.xml) reader
//!
//! Every `<dependency>` element with `org`, `name` and `rev` attributes
//! becomes a recommendation. Attribute order is free and elements may span
//! several lines.
//!
//! Format example:
//! ```text
//! <dependencies>
//!     <dependency org="org.slf4j" name="slf4j-api" rev="2.0.13"/>
//!     <dependency name="guava" org="com.google.guava"
//!                 rev="33.2.0-jre" conf="compile"/>
//! </dependencies>
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use regex::Regex;
use tracing::debug;

use crate::source::traits::{LoadOnce, RecommendationSource, SourceError, line_of, read_source};
use crate::source::types::{ArtifactKey, Recommendations, SourceKind};

/// Source reading an Ivy-style dependency descriptor
pub struct ManifestSource {
    path: PathBuf,
    loaded: LoadOnce,
    /// Regex for a dependency element: `<dependency ... />` or `<dependency ...>`
    dependency_re: Regex,
    /// Regex for a single attribute: `key="value"`
    attribute_re: Regex,
}

impl ManifestSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: LoadOnce::default(),
            dependency_re: Regex::new(r"(?s)<dependency\s([^>]*?)/?>").unwrap(),
            attribute_re: Regex::new(r#"([\w.:-]+)\s*=\s*["']([^"']*)["']"#).unwrap(),
        }
    }

    /// Parse descriptor content into recommendations
    pub fn parse(&self, content: &str, origin: &str) -> Result<Recommendations, SourceError> {
        let mut recommendations = Recommendations::new();

        for caps in self.dependency_re.captures_iter(content) {
            let element = caps.get(0).unwrap();
            let attributes: HashMap<&str, &str> = self
                .attribute_re
                .captures_iter(caps.get(1).unwrap().as_str())
                .map(|attr| (attr.get(1).unwrap().as_str(), attr.get(2).unwrap().as_str()))
                .collect();

            let (Some(org), Some(name)) = (attributes.get("org"), attributes.get("name")) else {
                return Err(SourceError::InvalidSyntax {
                    origin: origin.to_string(),
                    line: line_of(content, element.start()),
                    message: "dependency without org or name attribute".to_string(),
                });
            };

            // A dependency without a revision recommends nothing
            let Some(rev) = attributes.get("rev").filter(|rev| !rev.trim().is_empty()) else {
                debug!("Skipping {}:{} without rev in {}", org, name, origin);
                continue;
            };

            recommendations.insert(ArtifactKey::new(*org, *name), rev.trim().to_string());
        }

        Ok(recommendations)
    }
}

impl RecommendationSource for ManifestSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Manifest
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
