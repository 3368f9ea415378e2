//! Thread List Component
//!
//! Live discussion under a memory. Holds a realtime subscription for as
//! long as it is mounted; every change re-renders the full ordered list.
//! Authors can edit or delete their own threads.

use chrono::Utc;
use leptos::prelude::*;
use leptos::task::spawn_local;
use vault_core::api::{self, ApiResponse};
use vault_core::domain::Thread;
use vault_core::forms::{can_manage, Notice, ThreadActions, ThreadCall};
use vault_core::realtime::ThreadSubscription;
use vault_core::views::{format_date, FetchSequence, LoadState};
use vault_core::Session;

use crate::components::notice_stack::show_notice;
use crate::components::DeleteConfirmButton;
use crate::context::use_app_context;
use crate::store::use_app_store;

#[component]
pub fn ThreadList(memory_id: String, session: Session) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();
    let (threads, set_threads) = signal(LoadState::<Vec<Thread>>::Loading);
    let actions = RwSignal::new(ThreadActions::default());
    let session = StoredValue::new(session);
    let sequence = StoredValue::new(FetchSequence::default());

    // a slower fetch must not replace a newer list
    let apply = move |ticket: u64, list: ApiResponse<Vec<Thread>>| {
        if sequence.try_update_value(|s| s.accept(ticket)).unwrap_or(false) {
            set_threads.set(LoadState::from_list(list));
        }
    };

    // Initial load, and again on reload
    {
        let memory_id = memory_id.clone();
        Effect::new(move |_| {
            let _ = ctx.reload_trigger.get();
            let backend = ctx.backend();
            let memory_id = memory_id.clone();
            let ticket = sequence.try_update_value(|s| s.issue()).unwrap_or_default();
            spawn_local(async move {
                apply(ticket, api::list_threads(backend.as_ref(), &memory_id).await);
            });
        });
    }

    match ThreadSubscription::open(ctx.backend(), &memory_id) {
        Ok(mut subscription) => {
            let handle = subscription.dispose_handle();
            on_cleanup(move || handle.dispose());
            spawn_local(async move {
                while let Some(snapshot) = subscription.next_snapshot().await {
                    // fetched after the change, so newer than any load already running
                    let ticket = sequence.try_update_value(|s| s.issue()).unwrap_or_default();
                    apply(ticket, snapshot);
                }
            });
        }
        Err(err) => tracing::warn!(%err, %memory_id, "live thread updates unavailable"),
    }

    let run = move |call: ThreadCall| {
        let backend = ctx.backend();
        spawn_local(async move {
            show_notice(store, call.execute(backend.as_ref()).await);
        });
    };

    let save = move || {
        match actions.try_update(|a| a.save(Utc::now())) {
            Some(Ok(Some(call))) => run(call),
            Some(Err(err)) => show_notice(store, Notice::error("Invalid thread", err.message)),
            _ => {}
        }
    };

    let render_thread = move |thread: Thread| {
        let id = thread.id.clone();
        let mine = session.with_value(|s| can_manage(&thread, Some(s)));
        let author = if mine { "You".to_string() } else { "Member".to_string() };
        let when = format_date(thread.created_at);
        let edited = thread.is_edited;
        let content = thread.content.clone();
        let stored = StoredValue::new(thread);

        let editing = {
            let id = id.clone();
            Memo::new(move |_| actions.with(|a| a.editing(&id).is_some()))
        };
        let editing_id = id.clone();
        let confirm_id = id.clone();
        view! {
            <li class="thread">
                <div class="thread-meta">
                    <span class="thread-author">{author}</span>
                    <span class="thread-date">{when}</span>
                    <Show when=move || edited>
                        <span class="thread-edited">"(edited)"</span>
                    </Show>
                </div>
                // untracked draft: typing must not rebuild the editor
                {move || if editing.get() {
                    view! {
                        <div class="thread-editor">
                            <textarea
                                rows="3"
                                prop:value=actions.with_untracked(|a| a.editing(&editing_id).map(str::to_string)).unwrap_or_default()
                                on:input=move |ev| actions.update(|a| a.set_draft(event_target_value(&ev)))
                            ></textarea>
                            <button on:click=move |_| save()>"Save"</button>
                            <button class="cancel-btn" on:click=move |_| actions.update(|a| a.dismiss())>
                                "Cancel"
                            </button>
                        </div>
                    }.into_any()
                } else {
                    view! { <p class="thread-content">{content.clone()}</p> }.into_any()
                }}
                <Show when=move || mine>
                    <div class="thread-controls">
                        <button
                            class="edit-btn"
                            on:click=move |_| {
                                stored.with_value(|t| {
                                    session.with_value(|s| actions.update(|a| { a.begin_edit(t, Some(s)); }))
                                })
                            }
                        >
                            "Edit"
                        </button>
                        <DeleteConfirmButton
                            confirming=Signal::derive({
                                let confirm_id = confirm_id.clone();
                                move || actions.with(|a| a.confirming(&confirm_id))
                            })
                            on_request=Callback::new(move |_| {
                                stored.with_value(|t| {
                                    session.with_value(|s| actions.update(|a| { a.request_delete(t, Some(s)); }))
                                })
                            })
                            on_confirm=Callback::new(move |_| {
                                if let Some(Some(call)) = actions.try_update(|a| a.confirm_delete()) {
                                    run(call);
                                }
                            })
                            on_dismiss=Callback::new(move |_| actions.update(|a| a.dismiss()))
                        />
                    </div>
                </Show>
            </li>
        }
    };

    view! {
        <section class="thread-list">
            <h2>"Discussion"</h2>
            {move || match threads.get() {
                LoadState::Loading => view! { <p class="loading">"Loading threads..."</p> }.into_any(),
                LoadState::Empty => view! { <p class="empty">"No threads yet. Start the conversation."</p> }.into_any(),
                LoadState::Failed(message) => view! { <p class="load-error">{message}</p> }.into_any(),
                LoadState::Ready(list) => view! {
                    <ul>
                        {list.into_iter().map(render_thread).collect_view()}
                    </ul>
                }.into_any(),
            }}
        </section>
    }
}
