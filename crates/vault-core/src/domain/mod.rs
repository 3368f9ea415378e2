//! Domain Layer
//!
//! Record schemas for vaults, members, memories, threads and users.

mod entity;
mod member;
mod memory;
mod thread;
mod user;
mod vault;

pub use entity::{Record, Table, Timestamp};
pub use member::{can_write, Member, NewMember, Role};
pub use memory::{parse_tags, Memory, MemoryType, NewMemory};
pub use thread::{validate_content, NewThread, Thread, ThreadPatch, MAX_THREAD_CHARS};
pub use user::{NewUser, ProfileUpdate, User, MIN_NAME_CHARS};
pub use vault::{NewVault, Vault, DEFAULT_THEME};
