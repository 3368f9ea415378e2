//! Create Thread Form Component

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use vault_core::domain::{Role, MAX_THREAD_CHARS};
use vault_core::forms::{CreateThreadForm, FormPhase, SubmitOutcome};
use vault_core::Session;

use crate::components::notice_stack::show_notice;
use crate::context::use_app_context;
use crate::store::use_app_store;

#[component]
pub fn CreateThreadPanel(memory_id: String, session: Session, role: Option<Role>) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();

    let (content, set_content) = signal(String::new());
    let (error, set_error) = signal::<Option<String>>(None);
    let (phase, set_phase) = signal(FormPhase::Idle);
    let form = StoredValue::new_local(Rc::new(CreateThreadForm::with_observer(memory_id, move |p| {
        set_phase.set(p)
    })));
    let session = StoredValue::new(session);

    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let backend = ctx.backend();
        let form = form.get_value();
        let session = session.get_value();
        let text = content.get_untracked();
        spawn_local(async move {
            let outcome = form.submit(backend.as_ref(), Some(&session), role, &text).await;
            if let Some(notice) = outcome.notice() {
                show_notice(store, notice.clone());
            }
            match outcome {
                SubmitOutcome::Rejected { errors, .. } => {
                    set_error.set(errors.first().map(|e| e.message.clone()));
                }
                // the live list picks the new thread up
                SubmitOutcome::Succeeded { .. } => {
                    set_content.set(String::new());
                    set_error.set(None);
                }
                _ => {}
            }
        });
    };

    view! {
        <form class="create-thread-form" on:submit=submit>
            <textarea
                rows="3"
                placeholder="Share a thought about this memory..."
                prop:value=move || content.get()
                on:input=move |ev| set_content.set(event_target_value(&ev))
            ></textarea>
            <div class="thread-form-footer">
                <span class="char-count">
                    {move || format!("{}/{}", content.get().chars().count(), MAX_THREAD_CHARS)}
                </span>
                {move || error.get().map(|message| view! { <span class="field-error">{message}</span> })}
                <button type="submit" disabled=move || phase.get().is_busy()>
                    {move || if phase.get().is_busy() { "Posting..." } else { "Post" }}
                </button>
            </div>
        </form>
    }
}
