//! Dashboard Page
//!
//! The signed-in user's vaults, plus the create-vault dialog.

use leptos::prelude::*;
use leptos::task::spawn_local;
use vault_core::api;
use vault_core::domain::Vault;
use vault_core::views::LoadState;
use vault_core::Session;

use crate::components::{CreateVaultDialog, VaultGrid, VaultListing};
use crate::context::use_app_context;

#[component]
pub fn Dashboard(session: Session) -> impl IntoView {
    let ctx = use_app_context();
    let (vaults, set_vaults) = signal(LoadState::<Vec<Vault>>::Loading);
    let (show_create, set_show_create) = signal(false);
    let user_id = session.user_id().to_string();

    // Load vaults on mount and on reload
    Effect::new(move |_| {
        let _ = ctx.reload_trigger.get();
        let backend = ctx.backend();
        let user_id = user_id.clone();
        spawn_local(async move {
            let loaded = api::list_vaults_for_user(backend.as_ref(), &user_id).await;
            set_vaults.set(LoadState::from_list(loaded));
        });
    });

    let listing_url = ctx.config().api_base_url;
    let dialog_session = StoredValue::new(session);

    view! {
        <main class="dashboard">
            <div class="page-header">
                <h1>"Your Memory Vaults"</h1>
                <button class="primary-btn" on:click=move |_| set_show_create.set(true)>
                    "Create Vault"
                </button>
            </div>

            {move || match vaults.get() {
                LoadState::Loading => view! { <p class="loading">"Loading vaults..."</p> }.into_any(),
                LoadState::Empty => view! {
                    <div class="empty-state">
                        <p>"You don't have any vaults yet."</p>
                        <button class="primary-btn" on:click=move |_| set_show_create.set(true)>
                            "Create your first vault"
                        </button>
                    </div>
                }.into_any(),
                LoadState::Failed(message) => view! { <p class="load-error">{message}</p> }.into_any(),
                LoadState::Ready(list) => view! { <VaultGrid vaults=Signal::derive(move || list.clone()) /> }.into_any(),
            }}

            {listing_url.map(|base_url| view! { <VaultListing base_url=base_url /> })}

            <Show when=move || show_create.get()>
                <CreateVaultDialog
                    session=dialog_session.get_value()
                    on_close=Callback::new(move |_| set_show_create.set(false))
                />
            </Show>
        </main>
    }
}
