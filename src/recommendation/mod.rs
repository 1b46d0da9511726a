//! Provider chain and override lifecycle
//!
//! This module resolves recommended versions across an ordered chain of
//! providers and manages the temporary and persisted overrides of the
//! adaptable ones.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Resolver   │────▶│  Registry   │◀────│  Schedule   │
//! │ (fallback)  │     │ (providers) │     │ (DAG, run)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!                            ▼                   ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │  Lifecycle  │◀────│  Aggregate  │
//!                     │ (overrides) │     │ (all-of-op) │
//!                     └─────────────┘     └─────────────┘
//!                        │       │
//!                        ▼       ▼
//!                 ┌─────────┐ ┌─────────┐
//!                 │  Store  │ │ Update  │
//!                 └─────────┘ └─────────┘
//! ```
//!
//! # Modules
//!
//! - [`registry`]: Ordered, name-unique providers and the aggregate record
//! - [`resolver`]: First-wins lookup with isolated provider failures
//! - [`provider`]: A named source with optional override lifecycle
//! - [`lifecycle`]: Override state machine of one provider
//! - [`store`]: Atomic file store for persisted overrides
//! - [`update`]: Update source trait and update policies
//! - [`updates`]: Concrete update sources (Maven repository, property file)
//! - [`aggregate`]: Operations over every adaptable provider
//! - [`schedule`]: Operation parsing, ordering and execution
//! - [`semver`]: Shared semver utilities
//! - [`error`]: Error types of this layer

pub mod aggregate;
pub mod error;
pub mod lifecycle;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod schedule;
pub mod semver;
pub mod store;
pub mod update;
pub mod updates;
