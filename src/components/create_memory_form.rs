//! Create Memory Form Component
//!
//! Title, story, type, tags and optional unlock date. Photo memories take
//! a file; voice memories take a file or a fresh recording.

use std::rc::Rc;

use chrono::{NaiveDate, Utc};
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsCast;
use vault_core::domain::MemoryType;
use vault_core::forms::{CreateMemoryForm, FormPhase, MemoryDraft, SubmitOutcome};
use vault_core::Session;

use crate::components::notice_stack::show_notice;
use crate::components::{TypeSelector, VoiceRecorderPanel};
use crate::context::use_app_context;
use crate::media::read_file;
use crate::store::use_app_store;

fn picked_file(ev: &web_sys::Event) -> Option<web_sys::File> {
    ev.target()?
        .dyn_into::<web_sys::HtmlInputElement>()
        .ok()?
        .files()?
        .get(0)
}

#[component]
pub fn CreateMemoryPanel(
    vault_id: String,
    session: Session,
    #[prop(into)] on_created: Callback<()>,
) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();

    let (title, set_title) = signal(String::new());
    let (story, set_story) = signal(String::new());
    let (kind, set_kind) = signal(MemoryType::Text);
    let (tags, set_tags) = signal(String::new());
    let (unlock, set_unlock) = signal(String::new());
    let (file_name, set_file_name) = signal::<Option<String>>(None);
    let (recorded_url, set_recorded_url) = signal::<Option<String>>(None);
    let (errors, set_errors) = signal(Vec::<String>::new());
    let (phase, set_phase) = signal(FormPhase::Idle);

    let form = StoredValue::new_local(Rc::new(CreateMemoryForm::with_observer(vault_id, move |p| {
        set_phase.set(p)
    })));
    let picked = StoredValue::new_local(None::<web_sys::File>);
    let session = StoredValue::new(session);

    let reset = move || {
        set_title.set(String::new());
        set_story.set(String::new());
        set_kind.set(MemoryType::Text);
        set_tags.set(String::new());
        set_unlock.set(String::new());
        set_file_name.set(None);
        set_recorded_url.set(None);
        set_errors.set(Vec::new());
        picked.update_value(|f| *f = None);
    };

    let on_file = move |ev: web_sys::Event| {
        let file = picked_file(&ev);
        set_file_name.set(file.as_ref().map(|f| f.name()));
        picked.update_value(|f| *f = file);
    };

    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let backend = ctx.backend();
        let form = form.get_value();
        let session = session.get_value();
        let file = picked.get_value();
        let unlock_date = NaiveDate::parse_from_str(&unlock.get_untracked(), "%Y-%m-%d").ok();
        let draft = MemoryDraft {
            title: title.get_untracked(),
            story: story.get_untracked(),
            kind: kind.get_untracked(),
            tags: tags.get_untracked(),
            unlock_date,
            attachment: None,
            recorded_url: recorded_url.get_untracked(),
        };
        // read only once the form has marked itself busy
        let load = async move {
            match file {
                Some(file) => read_file(file).await.map(Some),
                None => Ok(None),
            }
        };

        spawn_local(async move {
            let outcome = form
                .submit_loading(backend.as_ref(), Some(&session), draft, load, Utc::now())
                .await;
            if let Some(notice) = outcome.notice() {
                show_notice(store, notice.clone());
            }
            match outcome {
                SubmitOutcome::Rejected { errors, .. } => {
                    set_errors.set(errors.iter().map(|e| e.message.clone()).collect());
                }
                SubmitOutcome::Succeeded { .. } => {
                    reset();
                    ctx.reload();
                    on_created.run(());
                }
                _ => {}
            }
        });
    };

    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();

    view! {
        <form class="create-memory-form" on:submit=submit>
            <h2>"Add a memory"</h2>

            <label>"Title"</label>
            <input
                type="text"
                placeholder="Grandpa's Workshop"
                prop:value=move || title.get()
                on:input=move |ev| set_title.set(event_target_value(&ev))
            />

            <label>"Story"</label>
            <textarea
                rows="5"
                placeholder="What happened?"
                prop:value=move || story.get()
                on:input=move |ev| set_story.set(event_target_value(&ev))
            ></textarea>

            <label>"Type"</label>
            <TypeSelector current_type=kind on_change=move |k| set_kind.set(k) />

            <Show when=move || kind.get() == MemoryType::Photo>
                <input type="file" accept="image/*" on:change=on_file />
            </Show>
            <Show when=move || kind.get() == MemoryType::Voice>
                <input type="file" accept="audio/*" on:change=on_file />
                <VoiceRecorderPanel on_recorded=Callback::new(move |url| set_recorded_url.set(Some(url))) />
                {move || recorded_url.get().map(|_| view! { <p class="recorded-ok">"Recording attached"</p> })}
            </Show>
            {move || file_name.get().map(|name| view! { <p class="picked-file">{name}</p> })}

            <label>"Tags"</label>
            <input
                type="text"
                placeholder="family, summer"
                prop:value=move || tags.get()
                on:input=move |ev| set_tags.set(event_target_value(&ev))
            />

            <label>"Unlock date (optional)"</label>
            <input
                type="date"
                min=today
                prop:value=move || unlock.get()
                on:input=move |ev| set_unlock.set(event_target_value(&ev))
            />

            <ul class="field-errors">
                {move || errors.get().into_iter().map(|e| view! { <li>{e}</li> }).collect_view()}
            </ul>

            <button type="submit" disabled=move || phase.get().is_busy()>
                {move || match phase.get() {
                    FormPhase::Submitting => "Saving...",
                    _ => "Save Memory",
                }}
            </button>
        </form>
    }
}
