//! Memory Page
//!
//! Full memory with its media and the live discussion beneath it.

use chrono::Utc;
use leptos::prelude::*;
use leptos::task::spawn_local;
use vault_core::api;
use vault_core::domain::{can_write, Memory, MemoryType, Role};
use vault_core::views::{LoadState, MemoryDisplay};
use vault_core::Session;

use crate::components::{CreateThreadPanel, ThreadList};
use crate::context::use_app_context;
use crate::store::{store_navigate, use_app_store, Route};

#[component]
pub fn MemoryPage(vault_id: String, memory_id: String, session: Session) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();
    let (memory, set_memory) = signal(LoadState::<Memory>::Loading);
    let (role, set_role) = signal::<Option<Role>>(None);

    {
        let vault_id = vault_id.clone();
        let memory_id = memory_id.clone();
        let user_id = session.user_id().to_string();
        Effect::new(move |_| {
            let backend = ctx.backend();
            let (vault_id, memory_id, user_id) = (vault_id.clone(), memory_id.clone(), user_id.clone());
            spawn_local(async move {
                set_memory.set(LoadState::from_response(api::get_memory(backend.as_ref(), &memory_id).await));
                if let Ok(found) = api::get_vault_role(backend.as_ref(), &vault_id, &user_id).await.into_result() {
                    set_role.set(found);
                }
            });
        });
    }

    let back = Route::Vault { vault_id };
    let thread_props = StoredValue::new((memory_id, session));

    view! {
        <main class="memory-page">
            <button class="back-btn" on:click=move |_| store_navigate(&store, back.clone())>
                "← Back to vault"
            </button>
            {move || match memory.get() {
                LoadState::Loading => view! { <p class="loading">"Loading memory..."</p> }.into_any(),
                LoadState::Failed(message) => view! { <p class="load-error">{message}</p> }.into_any(),
                LoadState::Empty => view! { <p class="empty">"Memory not found"</p> }.into_any(),
                LoadState::Ready(memory) => {
                    let display = MemoryDisplay::new(&memory, Utc::now());
                    let locked = display.locked;
                    view! {
                        <article class="memory-detail">
                            <h1>{display.title}</h1>
                            <p class="memory-date">{display.created_label}</p>
                            {display.unlock_label.map(|label| view! { <p class="memory-locked">"🔒 " {label}</p> })}
                            {display.media_url.map(|url| if display.kind == MemoryType::Voice {
                                view! { <audio controls=true src=url></audio> }.into_any()
                            } else {
                                view! { <img class="memory-photo" src=url alt="" /> }.into_any()
                            })}
                            {display.story.map(|story| view! { <p class="memory-story">{story}</p> })}
                            <div class="memory-tags">
                                {memory.tags.iter().map(|tag| view! { <span class="tag">{tag.clone()}</span> }).collect_view()}
                            </div>
                        </article>
                        <Show when=move || !locked>
                            {move || {
                                let (memory_id, session) = thread_props.get_value();
                                let form_props = (memory_id.clone(), session.clone());
                                view! {
                                    <Show when=move || can_write(role.get())>
                                        <CreateThreadPanel
                                            memory_id=form_props.0.clone()
                                            session=form_props.1.clone()
                                            role=role.get_untracked()
                                        />
                                    </Show>
                                    <ThreadList memory_id=memory_id session=session />
                                }
                            }}
                        </Show>
                    }.into_any()
                }
            }}
        </main>
    }
}
