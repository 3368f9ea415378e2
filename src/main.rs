#![allow(warnings)]
//! Memory Vault Frontend Entry Point

mod app;
mod components;
mod context;
mod logging;
mod media;
mod realtime_socket;
mod store;

use app::App;
use leptos::prelude::*;
use vault_core::ClientConfig;

/// Settings baked in at build time from `VAULT_*` environment variables
fn build_config() -> ClientConfig {
    ClientConfig::from_lookup(|key| {
        let value = match key {
            "VAULT_SUPABASE_URL" => option_env!("VAULT_SUPABASE_URL"),
            "VAULT_ANON_KEY" => option_env!("VAULT_ANON_KEY"),
            "VAULT_API_BASE_URL" => option_env!("VAULT_API_BASE_URL"),
            "VAULT_DATA_BACKEND" => option_env!("VAULT_DATA_BACKEND"),
            "VAULT_LOG_LEVEL" => option_env!("VAULT_LOG_LEVEL"),
            "VAULT_MAX_RECORDING_SECS" => option_env!("VAULT_MAX_RECORDING_SECS"),
            _ => None,
        };
        value.map(str::to_string)
    })
}

fn main() {
    console_error_panic_hook::set_once();
    let config = build_config();
    logging::init(&config.log_level);
    tracing::info!(backend = ?config.data_backend, "starting Memory Vault");
    mount_to_body(move || view! { <App config=config.clone() /> });
}
