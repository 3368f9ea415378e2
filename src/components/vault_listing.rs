//! Vault Listing Component
//!
//! Vaults from the internal `/api/v1/vaults` service, when one is configured.

use leptos::prelude::*;
use leptos::task::spawn_local;
use vault_core::api;
use vault_core::domain::Vault;
use vault_core::views::LoadState;

use crate::components::VaultGrid;

#[component]
pub fn VaultListing(base_url: String) -> impl IntoView {
    let (state, set_state) = signal(LoadState::<Vec<Vault>>::Loading);

    Effect::new(move |_| {
        let base_url = base_url.clone();
        spawn_local(async move {
            set_state.set(LoadState::from_list(api::fetch_vault_listing(&base_url).await));
        });
    });

    view! {
        <section class="vault-listing">
            <h2>"All vaults"</h2>
            {move || match state.get() {
                LoadState::Loading => view! { <p class="loading">"Loading..."</p> }.into_any(),
                LoadState::Empty => view! { <p class="empty">"No vaults listed"</p> }.into_any(),
                LoadState::Failed(message) => view! { <p class="load-error">{message}</p> }.into_any(),
                LoadState::Ready(vaults) => view! { <VaultGrid vaults=Signal::derive(move || vaults.clone()) /> }.into_any(),
            }}
        </section>
    }
}
