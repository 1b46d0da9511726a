#![allow(dead_code)]

pub mod registry;

pub use registry::{
    FailingSource, OfflineUpdateSource, StubUpdateSource, adaptable_provider, inline_source,
    registry_of, write_file,
};
