//! Property set reader
//!
//! Reads plain `key=value` files where the key is an artifact key.
//! `#` and `!` start comment lines, `:` is not a separator because it is
//! part of every key.
//!
//! Format example:
//! ```text
//! # platform versions
//! org.slf4j:slf4j-api = 2.0.13
//! com.fasterxml.jackson.core:* = 2.17.1
//! ```

use std::path::{Path, PathBuf};

use crate::source::traits::{LoadOnce, RecommendationSource, SourceError, read_source};
use crate::source::types::{ArtifactKey, Recommendations, SourceKind};

/// Parse one line into a trimmed `(key, value)` pair
///
/// Returns `None` for blank and comment lines.
fn parse_line(
    line: &str,
    line_num: usize,
    origin: &str,
) -> Result<Option<(String, String)>, SourceError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
        return Ok(None);
    }

    let (key, value) = trimmed
        .split_once('=')
        .ok_or_else(|| SourceError::InvalidSyntax {
            origin: origin.to_string(),
            line: line_num,
            message: format!("expected key=value, found '{}'", trimmed),
        })?;

    Ok(Some((key.trim().to_string(), value.trim().to_string())))
}

/// Split property content into raw `(key, value)` pairs
pub fn parse_pairs(content: &str, origin: &str) -> Result<Vec<(String, String)>, SourceError> {
    let mut pairs = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if let Some(pair) = parse_line(line, index + 1, origin)? {
            pairs.push(pair);
        }
    }
    Ok(pairs)
}

/// Parse property content into recommendations
pub fn parse_recommendations(content: &str, origin: &str) -> Result<Recommendations, SourceError> {
    let mut recommendations = Recommendations::new();

    for (index, line) in content.lines().enumerate() {
        let line_num = index + 1;
        let Some((key, version)) = parse_line(line, line_num, origin)? else {
            continue;
        };

        let key = key
            .parse::<ArtifactKey>()
            .map_err(|e| SourceError::InvalidSyntax {
                origin: origin.to_string(),
                line: line_num,
                message: e.to_string(),
            })?;

        if version.is_empty() {
            return Err(SourceError::InvalidSyntax {
                origin: origin.to_string(),
                line: line_num,
                message: format!("empty version for {}", key),
            });
        }

        recommendations.insert(key, version);
    }

    Ok(recommendations)
}

/// Render recommendations as property content, one entry per line in key order
pub fn format_recommendations(header: &str, recommendations: &Recommendations) -> String {
    let mut content = String::new();
    for line in header.lines() {
        content.push_str("# ");
        content.push_str(line);
        content.push('\n');
    }
    for (key, version) in recommendations {
        content.push_str(&format!("{}={}\n", key, version));
    }
    content
}

/// Source backed by a property file or an inline property set
#[derive(Debug)]
pub struct PropertiesSource {
    path: Option<PathBuf>,
    loaded: LoadOnce,
}

impl PropertiesSource {
    /// Source reading the property file at `path` on first use
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            loaded: LoadOnce::default(),
        }
    }

    /// Source with a fixed set of recommendations
    pub fn inline(recommendations: Recommendations) -> Self {
        Self {
            path: None,
            loaded: LoadOnce::loaded(recommendations),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl RecommendationSource for PropertiesSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Properties
    }

    fn origin(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "inline properties".to_string())
    }

    fn recommendations(&self) -> Result<&Recommendations, SourceError> {
        self.loaded.get_or_load(|| match &self.path {
            Some(path) => {
                let content = read_source(path)?;
                parse_recommendations(&content, &path.display().to_string())
            }
            None => Ok(Recommendations::new()),
        })
    }
}
