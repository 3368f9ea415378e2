//! Memory Vault App
//!
//! Session start-up and page switching.

use leptos::prelude::*;
use leptos::task::spawn_local;
use reactive_stores::Store;
use vault_core::api::{self, ApiResponse};
use vault_core::session::{token_from_fragment, ACCESS_TOKEN_KEY};
use vault_core::{ClientConfig, SessionState};

use crate::components::{Dashboard, MemoryPage, NoticeStack, ProfilePage, TitleBar, VaultPage};
use crate::context::AppContext;
use crate::store::{AppState, AppStateStoreFields, Route};

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// Token from an auth redirect, else the one kept from last time
fn pending_access_token() -> Option<String> {
    let window = web_sys::window()?;
    let hash = window.location().hash().unwrap_or_default();
    if let Some(token) = token_from_fragment(&hash) {
        // keep the token out of the address bar
        let _ = window.location().set_hash("");
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(ACCESS_TOKEN_KEY, &token);
        }
        return Some(token);
    }
    local_storage()?.get_item(ACCESS_TOKEN_KEY).ok().flatten()
}

#[component]
pub fn App(config: ClientConfig) -> impl IntoView {
    let reload_trigger = signal(0u32);
    let ctx = AppContext::new(config, reload_trigger);
    let store = Store::new(AppState::default());

    // Provide context to all children
    provide_context(ctx);
    provide_context(store);

    // Start the session once
    Effect::new(move |_| {
        let backend = ctx.backend();
        let hosted = ctx.hosted();
        spawn_local(async move {
            let response = match hosted {
                Some(hosted) => match pending_access_token() {
                    Some(token) => api::restore_session(&hosted, &token).await,
                    None => {
                        ctx.session.set(SessionState::SignedOut);
                        return;
                    }
                },
                None => api::start_demo_session(backend.as_ref()).await,
            };
            match response {
                ApiResponse::Ok(session) => {
                    tracing::info!(user_id = %session.user_id(), "session started");
                    ctx.session.set(SessionState::SignedIn(session));
                }
                ApiResponse::Err(err) => {
                    tracing::warn!(%err, "session could not be restored");
                    if let Some(storage) = local_storage() {
                        let _ = storage.remove_item(ACCESS_TOKEN_KEY);
                    }
                    ctx.session.set(SessionState::SignedOut);
                }
            }
        });
    });

    view! {
        <div class="app-layout">
            <TitleBar />
            {move || match ctx.session.get() {
                SessionState::Restoring => view! { <p class="loading">"Loading..."</p> }.into_any(),
                SessionState::SignedOut => view! {
                    <main class="signed-out">
                        <h1>"Memory Vault"</h1>
                        <p>"You are signed out. Sign in to see your vaults."</p>
                    </main>
                }.into_any(),
                SessionState::SignedIn(session) => {
                    move || match store.route().get() {
                        Route::Dashboard => view! { <Dashboard session=session.clone() /> }.into_any(),
                        Route::Vault { vault_id } => view! {
                            <VaultPage vault_id=vault_id session=session.clone() />
                        }.into_any(),
                        Route::Memory { vault_id, memory_id } => view! {
                            <MemoryPage vault_id=vault_id memory_id=memory_id session=session.clone() />
                        }.into_any(),
                        Route::Profile => view! { <ProfilePage session=session.clone() /> }.into_any(),
                    }
                }.into_any(),
            }}
            <NoticeStack />
        </div>
    }
}
