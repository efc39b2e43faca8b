//! Bounded-concurrency clip generator for MV Orchestra's Phase 5: selects
//! a backend per clip, retries with fallback on failure, and returns
//! results sorted by `clip_id`.

pub mod backend_client;
pub mod config;
pub mod error;
pub mod generator;
pub mod selector;

pub use backend_client::{BackendClient, SubprocessBackendClient};
pub use config::ClipGenConfig;
pub use error::{ClipGenError, ClipGenResult};
pub use generator::ClipGenerator;
pub use selector::{BackendSelector, ClipRequirements};
