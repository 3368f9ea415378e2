//! Vault Page
//!
//! One vault's memories, newest first. Owners and editors can add memories.

use leptos::prelude::*;
use leptos::task::spawn_local;
use vault_core::api;
use vault_core::domain::{can_write, Memory, Role, Vault};
use vault_core::views::{memory_count_label, LoadState};
use vault_core::Session;

use crate::components::{CreateMemoryPanel, MemoryCard};
use crate::context::use_app_context;
use crate::store::{store_navigate, use_app_store, Route};

#[component]
pub fn VaultPage(vault_id: String, session: Session) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();
    let (vault, set_vault) = signal(LoadState::<Vault>::Loading);
    let (memories, set_memories) = signal(LoadState::<Vec<Memory>>::Loading);
    let (role, set_role) = signal::<Option<Role>>(None);
    let (adding, set_adding) = signal(false);
    let user_id = session.user_id().to_string();

    {
        let vault_id = vault_id.clone();
        Effect::new(move |_| {
            let _ = ctx.reload_trigger.get();
            let backend = ctx.backend();
            let vault_id = vault_id.clone();
            let user_id = user_id.clone();
            spawn_local(async move {
                set_vault.set(LoadState::from_response(api::get_vault(backend.as_ref(), &vault_id).await));
                set_memories.set(LoadState::from_list(api::list_memories(backend.as_ref(), &vault_id).await));
                match api::get_vault_role(backend.as_ref(), &vault_id, &user_id).await.into_result() {
                    Ok(found) => set_role.set(found),
                    Err(err) => tracing::warn!(%err, "could not resolve vault role"),
                }
            });
        });
    }

    let panel_props = StoredValue::new((vault_id, session));

    view! {
        <main class="vault-page">
            <button class="back-btn" on:click=move |_| store_navigate(&store, Route::Dashboard)>
                "← All vaults"
            </button>
            <div class="page-header">
                <div>
                    <h1>
                        {move || match vault.get() {
                            LoadState::Ready(v) => v.name,
                            LoadState::Failed(_) => "Vault unavailable".to_string(),
                            _ => "Loading...".to_string(),
                        }}
                    </h1>
                    <span class="memory-count">
                        {move || memories.with(|m| memory_count_label(m.ready().map(Vec::len).unwrap_or(0)))}
                    </span>
                </div>
                <Show when=move || can_write(role.get())>
                    <button class="primary-btn" on:click=move |_| set_adding.update(|a| *a = !*a)>
                        {move || if adding.get() { "Close" } else { "Add Memory" }}
                    </button>
                </Show>
            </div>

            <Show when=move || adding.get() && can_write(role.get())>
                {move || {
                    let (vault_id, session) = panel_props.get_value();
                    view! {
                        <CreateMemoryPanel
                            vault_id=vault_id
                            session=session
                            on_created=Callback::new(move |_| set_adding.set(false))
                        />
                    }
                }}
            </Show>

            {move || match memories.get() {
                LoadState::Loading => view! { <p class="loading">"Loading memories..."</p> }.into_any(),
                LoadState::Empty => view! {
                    <p class="empty-state">"No memories yet. Add the first one."</p>
                }.into_any(),
                LoadState::Failed(message) => view! { <p class="load-error">{message}</p> }.into_any(),
                LoadState::Ready(list) => view! {
                    <div class="memory-grid">
                        {list.into_iter().map(|memory| view! { <MemoryCard memory=memory /> }).collect_view()}
                    </div>
                }.into_any(),
            }}
        </main>
    }
}
