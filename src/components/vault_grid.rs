//! Vault Grid Component

use leptos::prelude::*;
use vault_core::domain::Vault;
use vault_core::views::format_date;

use crate::store::{store_navigate, use_app_store, Route};

#[component]
pub fn VaultGrid(#[prop(into)] vaults: Signal<Vec<Vault>>) -> impl IntoView {
    let store = use_app_store();

    view! {
        <div class="vault-grid">
            <For
                each=move || vaults.get()
                key=|vault| vault.id.clone()
                children=move |vault| {
                    let class = format!("vault-card {}", vault.background_class());
                    let vault_id = vault.id.clone();
                    view! {
                        <button
                            class=class
                            on:click=move |_| store_navigate(&store, Route::Vault { vault_id: vault_id.clone() })
                        >
                            <h3 class="vault-name">{vault.name}</h3>
                            <span class="vault-created">{format!("Created {}", format_date(vault.created_at))}</span>
                        </button>
                    }
                }
            />
        </div>
    }
}
