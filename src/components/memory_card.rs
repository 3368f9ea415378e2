//! Memory Card Component
//!
//! Summary tile for one memory. Locked memories hide their story and
//! cannot be opened until the unlock date.

use chrono::Utc;
use leptos::prelude::*;
use vault_core::domain::{Memory, MemoryType};
use vault_core::views::MemoryDisplay;

use crate::store::{store_navigate, use_app_store, Route};

fn type_icon(kind: MemoryType) -> &'static str {
    match kind {
        MemoryType::Text => "📝",
        MemoryType::Photo => "📷",
        MemoryType::Voice => "🎙",
    }
}

#[component]
pub fn MemoryCard(memory: Memory) -> impl IntoView {
    let store = use_app_store();
    let display = MemoryDisplay::new(&memory, Utc::now());
    let route = Route::Memory {
        vault_id: memory.vault_id.clone(),
        memory_id: memory.id.clone(),
    };
    let locked = display.locked;
    let overflow = display.tags.overflow_label();

    view! {
        <article class=if locked { "memory-card locked" } else { "memory-card" }>
            <header class="memory-card-header">
                <span class="memory-type">{type_icon(display.kind)} " " {display.kind.label()}</span>
                <span class="memory-date">{display.created_label}</span>
            </header>
            <h3 class="memory-title">{display.title}</h3>
            {match display.unlock_label {
                Some(label) => view! { <p class="memory-locked">"🔒 " {label}</p> }.into_any(),
                None => view! { <p class="memory-story">{display.story.unwrap_or_default()}</p> }.into_any(),
            }}
            {(display.kind == MemoryType::Photo).then(|| display.media_url.clone()).flatten().map(|url| view! {
                <img class="memory-thumb" src=url alt="" />
            })}
            <div class="memory-tags">
                {display.tags.shown.into_iter().map(|tag| view! { <span class="tag">{tag}</span> }).collect_view()}
                {overflow.map(|label| view! { <span class="tag more">{label}</span> })}
            </div>
            <button
                class="memory-open"
                disabled=locked
                on:click=move |_| store_navigate(&store, route.clone())
            >
                {if locked { "Locked" } else { "View Memory" }}
            </button>
        </article>
    }
}
