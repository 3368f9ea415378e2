//! Create Vault Dialog Component
//!
//! Modal with a single name field. Closes and reloads on success.

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use vault_core::forms::{CreateVaultForm, FormPhase, SubmitOutcome};
use vault_core::Session;

use crate::components::notice_stack::show_notice;
use crate::context::use_app_context;
use crate::store::use_app_store;

#[component]
pub fn CreateVaultDialog(session: Session, #[prop(into)] on_close: Callback<()>) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();

    let (name, set_name) = signal(String::new());
    let (phase, set_phase) = signal(FormPhase::Idle);
    let (field_error, set_field_error) = signal::<Option<String>>(None);
    let form = StoredValue::new_local(Rc::new(CreateVaultForm::with_observer(move |p| set_phase.set(p))));
    let session = StoredValue::new(session);

    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let backend = ctx.backend();
        let form = form.get_value();
        let session = session.get_value();
        let entered = name.get_untracked();
        spawn_local(async move {
            let outcome = form.submit(backend.as_ref(), Some(&session), &entered).await;
            if let Some(notice) = outcome.notice() {
                show_notice(store, notice.clone());
            }
            match outcome {
                SubmitOutcome::Rejected { errors, .. } => {
                    set_field_error.set(errors.first().map(|e| e.message.clone()));
                }
                SubmitOutcome::Succeeded { .. } => {
                    set_name.set(String::new());
                    set_field_error.set(None);
                    ctx.reload();
                    on_close.run(());
                }
                _ => {}
            }
        });
    };

    view! {
        <div class="modal-backdrop" on:click=move |_| on_close.run(())>
            <form
                class="modal create-vault-dialog"
                on:click=|ev| ev.stop_propagation()
                on:submit=submit
            >
                <h2>"Create a new vault"</h2>
                <label for="vault-name">"Vault name"</label>
                <input
                    id="vault-name"
                    type="text"
                    placeholder="Family Stories"
                    prop:value=move || name.get()
                    on:input=move |ev| set_name.set(event_target_value(&ev))
                />
                {move || field_error.get().map(|message| view! { <p class="field-error">{message}</p> })}
                <div class="modal-actions">
                    <button type="button" class="cancel-btn" on:click=move |_| on_close.run(())>
                        "Cancel"
                    </button>
                    <button type="submit" disabled=move || phase.get().is_busy()>
                        {move || if phase.get().is_busy() { "Creating..." } else { "Create Vault" }}
                    </button>
                </div>
            </form>
        </div>
    }
}
