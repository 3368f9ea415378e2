//! Profile Page
//!
//! Edit display name, email and avatar. Field errors show under each field.

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use vault_core::forms::{FormPhase, ProfileForm, SubmitOutcome};
use vault_core::{Session, SessionState};

use crate::components::notice_stack::show_notice;
use crate::context::use_app_context;
use crate::store::use_app_store;

#[component]
pub fn ProfilePage(session: Session) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();
    let user = session.user.clone();

    let (name, set_name) = signal(user.name.clone());
    let (email, set_email) = signal(user.email.clone());
    let (avatar, set_avatar) = signal(user.avatar_url.clone().unwrap_or_default());
    let (field_errors, set_field_errors) = signal(Vec::<(&'static str, String)>::new());
    let (phase, set_phase) = signal(FormPhase::Idle);
    let form = StoredValue::new_local(Rc::new(ProfileForm::with_observer(move |p| set_phase.set(p))));
    let session = StoredValue::new(session);

    let error_for = move |field: &'static str| {
        move || {
            field_errors
                .get()
                .into_iter()
                .find(|(f, _)| *f == field)
                .map(|(_, message)| view! { <p class="field-error">{message}</p> })
        }
    };

    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let backend = ctx.backend();
        let form = form.get_value();
        let current = session.get_value();
        let (n, e, a) = (name.get_untracked(), email.get_untracked(), avatar.get_untracked());
        spawn_local(async move {
            let outcome = form.submit(backend.as_ref(), Some(&current), &n, &e, &a).await;
            if let Some(notice) = outcome.notice() {
                show_notice(store, notice.clone());
            }
            match outcome {
                SubmitOutcome::Rejected { errors, .. } => {
                    set_field_errors.set(errors.into_iter().map(|e| (e.field, e.message)).collect());
                }
                SubmitOutcome::Succeeded { value, .. } => {
                    set_field_errors.set(Vec::new());
                    let updated = Session::new(value, current.access_token.clone());
                    ctx.session.set(SessionState::SignedIn(updated));
                }
                _ => {}
            }
        });
    };

    view! {
        <main class="profile-page">
            <h1>"Your Profile"</h1>
            <div class="avatar large">
                {move || {
                    let url = avatar.get();
                    if url.trim().is_empty() {
                        view! { <span>{user.initial()}</span> }.into_any()
                    } else {
                        view! { <img src=url alt="" /> }.into_any()
                    }
                }}
            </div>
            <form class="profile-form" on:submit=submit>
                <label>"Name"</label>
                <input
                    type="text"
                    prop:value=move || name.get()
                    on:input=move |ev| set_name.set(event_target_value(&ev))
                />
                {error_for("name")}

                <label>"Email"</label>
                <input
                    type="email"
                    prop:value=move || email.get()
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                />
                {error_for("email")}

                <label>"Avatar URL"</label>
                <input
                    type="url"
                    placeholder="https://"
                    prop:value=move || avatar.get()
                    on:input=move |ev| set_avatar.set(event_target_value(&ev))
                />
                {error_for("avatar_url")}

                <button type="submit" disabled=move || phase.get().is_busy()>
                    {move || if phase.get().is_busy() { "Saving..." } else { "Save Profile" }}
                </button>
            </form>
        </main>
    }
}
