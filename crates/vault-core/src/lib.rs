//! Memory Vault Core
//!
//! Layered the same way as the front end consumes it:
//! - domain: record schemas and boundary validation
//! - repository: the hosted-service seam (`Backend`) and its implementations
//! - api: one data-access function per entity operation, returning `ApiResponse`
//! - realtime: thread change subscriptions
//! - forms / recorder: UI state machines with no browser dependency
//! - session / views / config: explicit user session, display state, settings

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod forms;
pub mod realtime;
pub mod recorder;
pub mod repository;
pub mod session;
pub mod views;

pub use api::ApiResponse;
pub use config::{ClientConfig, DataBackend};
pub use error::{ApiError, BackendError, BackendResult, SchemaError, ValidationError};
pub use repository::{Backend, InMemoryBackend, SupabaseBackend};
pub use session::{Session, SessionState};
