//! Repository Layer
//!
//! The hosted-service seam and its two implementations.

mod feed;
mod memory_backend;
mod query;
mod supabase;
mod traits;

pub use feed::{ChangeEvent, ChangeFeed, ChangeKind, ChangeSender, ChangeSource};
pub use memory_backend::{Call, InMemoryBackend, Operation, MEMORY_STORAGE_BASE};
pub use query::{filter_params, Direction, Filter, Order, Query};
pub use supabase::{encode_object_path, AuthUser, SupabaseBackend, STORAGE_CACHE_SECS};
pub use traits::{Backend, Upload};
