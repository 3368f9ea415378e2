//! Title Bar Component
//!
//! App header with navigation home, the signed-in user and sign-out.

use leptos::prelude::*;
use leptos::task::spawn_local;
use vault_core::api;
use vault_core::forms::Notice;
use vault_core::session::ACCESS_TOKEN_KEY;
use vault_core::SessionState;

use crate::components::notice_stack::show_notice;
use crate::context::use_app_context;
use crate::store::{store_navigate, use_app_store, Route};

fn forget_stored_token() {
    let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
    if let Some(storage) = storage {
        let _ = storage.remove_item(ACCESS_TOKEN_KEY);
    }
}

#[component]
pub fn TitleBar() -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();

    let sign_out = move |_| {
        let hosted = ctx.hosted();
        spawn_local(async move {
            if let Some(backend) = hosted {
                if let Some(err) = api::sign_out(&backend).await.error() {
                    show_notice(store, Notice::error("Sign out failed", err));
                    return;
                }
            }
            forget_stored_token();
            ctx.session.set(SessionState::SignedOut);
            store_navigate(&store, Route::Dashboard);
        });
    };

    view! {
        <header class="titlebar">
            <button class="titlebar-title" on:click=move |_| store_navigate(&store, Route::Dashboard)>
                "Memory Vault"
            </button>
            {move || ctx.current_session().map(|session| {
                let user = session.user;
                view! {
                    <div class="titlebar-user">
                        <button
                            class="avatar"
                            title="Profile"
                            on:click=move |_| store_navigate(&store, Route::Profile)
                        >
                            {match user.avatar_url.clone() {
                                Some(url) => view! { <img src=url alt="" /> }.into_any(),
                                None => view! { <span>{user.initial()}</span> }.into_any(),
                            }}
                        </button>
                        <span class="titlebar-name">{user.name.clone()}</span>
                        <button class="titlebar-btn" on:click=sign_out>"Sign out"</button>
                    </div>
                }
            })}
        </header>
    }
}
