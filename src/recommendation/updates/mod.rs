//! Concrete update source implementations

pub mod maven;
pub mod properties;

pub use maven::MavenRepositoryUpdateSource;
pub use properties::PropertiesUpdateSource;
