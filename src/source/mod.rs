//! Recommendation source layer
//! - traits.rs: RecommendationSource trait definition
//! - types.rs: Common types (ArtifactKey, SourceKind, Recommendations)
//! - manifest.rs: Ivy-style dependency descriptor reader
//! - bom.rs: Maven BOM reader
//! - properties.rs: key=value property set reader

pub mod bom;
pub mod manifest;
pub mod properties;
pub mod traits;
pub mod types;

pub use bom::BomSource;
pub use manifest::ManifestSource;
pub use properties::PropertiesSource;
pub use traits::{RecommendationSource, SourceError};
pub use types::{ArtifactKey, Recommendations, SourceKind};
