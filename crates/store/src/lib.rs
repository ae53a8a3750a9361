//! `store` crate — persistence of named flows.
//!
//! Flows are stored as opaque JSON definitions next to a name and a creation
//! timestamp.  No domain types live here: the engine crate converts between
//! its `Graph` and the stored definition.

pub mod error;
pub mod models;
pub mod repository;

pub use error::StoreError;
pub use models::{FlowId, FlowRow};
pub use repository::{FlowStore, JsonDirStore, MemoryStore};
