//! UI Components
//!
//! Pages and reusable Leptos components.

pub mod notice_stack;
mod title_bar;
mod delete_confirm_button;
mod type_selector;
mod vault_grid;
mod vault_listing;
mod create_vault_dialog;
mod memory_card;
mod create_memory_form;
mod voice_recorder;
mod create_thread_form;
mod thread_list;
mod dashboard;
mod vault_page;
mod memory_page;
mod profile_page;

pub use notice_stack::NoticeStack;
pub use title_bar::TitleBar;
pub use delete_confirm_button::DeleteConfirmButton;
pub use type_selector::TypeSelector;
pub use vault_grid::VaultGrid;
pub use vault_listing::VaultListing;
pub use create_vault_dialog::CreateVaultDialog;
pub use memory_card::MemoryCard;
pub use create_memory_form::CreateMemoryPanel;
pub use voice_recorder::VoiceRecorderPanel;
pub use create_thread_form::CreateThreadPanel;
pub use thread_list::ThreadList;
pub use dashboard::Dashboard;
pub use vault_page::VaultPage;
pub use memory_page::MemoryPage;
pub use profile_page::ProfilePage;
