//! Notice Stack Component
//!
//! Toast-style success/error notices in a corner of the screen.

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use vault_core::forms::{Notice, Tone};

use crate::store::{store_dismiss_notice, store_push_notice, use_app_store, AppStateStoreFields, AppStore};

const NOTICE_LIFETIME_MS: u32 = 5_000;

/// Show a notice and dismiss it after a while
pub fn show_notice(store: AppStore, notice: Notice) {
    let id = store_push_notice(&store, notice);
    Timeout::new(NOTICE_LIFETIME_MS, move || store_dismiss_notice(&store, id)).forget();
}

#[component]
pub fn NoticeStack() -> impl IntoView {
    let store = use_app_store();

    view! {
        <div class="notice-stack">
            <For
                each=move || store.toasts().get()
                key=|toast| toast.id
                children=move |toast| {
                    let id = toast.id;
                    let class = match toast.notice.tone {
                        Tone::Success => "notice success",
                        Tone::Error => "notice error",
                    };
                    view! {
                        <div class=class role="status">
                            <div class="notice-body">
                                <strong class="notice-title">{toast.notice.title}</strong>
                                <p class="notice-description">{toast.notice.description}</p>
                            </div>
                            <button
                                class="notice-close"
                                on:click=move |_| store_dismiss_notice(&store, id)
                            >
                                "×"
                            </button>
                        </div>
                    }
                }
            />
        </div>
    }
}
