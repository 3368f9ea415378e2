//! Global Application State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity.
//! Holds the current route and the notice stack; data lives in the pages.

use leptos::prelude::*;
use reactive_stores::Store;
use vault_core::forms::Notice;

/// In-app navigation target
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Route {
    #[default]
    Dashboard,
    Vault { vault_id: String },
    Memory { vault_id: String, memory_id: String },
    Profile,
}

/// A notice on screen, keyed for dismissal
#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub id: u32,
    pub notice: Notice,
}

/// Global application state with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct AppState {
    /// Page being shown
    pub route: Route,
    /// Notices, oldest first
    pub toasts: Vec<Toast>,
    /// Id for the next toast
    pub next_toast_id: u32,
}

/// Type alias for the store
pub type AppStore = Store<AppState>;

/// Get the app store from context
pub fn use_app_store() -> AppStore {
    expect_context::<AppStore>()
}

// ========================
// Store Helper Functions
// ========================

pub fn store_navigate(store: &AppStore, route: Route) {
    store.route().set(route);
}

/// Push a notice and return its id
pub fn store_push_notice(store: &AppStore, notice: Notice) -> u32 {
    let id = store.next_toast_id().get_untracked();
    store.next_toast_id().set(id + 1);
    store.toasts().write().push(Toast { id, notice });
    id
}

pub fn store_dismiss_notice(store: &AppStore, id: u32) {
    store.toasts().write().retain(|toast| toast.id != id);
}
