//! Atomic, crash-consistent session-state store for MV Orchestra.
//!
//! - [`atomic`]: temp-file + fsync + rename primitive.
//! - [`validation`]: session-id and path-safety checks.
//! - [`session_state`]: the `SessionStore` that owns a session's lifecycle.

pub mod atomic;
pub mod error;
pub mod session_state;
pub mod validation;

pub use atomic::{read_json, write_atomic, write_json_atomic};
pub use error::{StoreError, StoreResult};
pub use session_state::{PipelineProgress, PipelineValidation, SessionStore};
pub use validation::{sanitize_filename, validate_json_size, validate_path_within, validate_session_id};
