//! Delete Confirm Button Component
//!
//! Inline delete confirmation driven by the caller's state.

use leptos::prelude::*;

/// Inline delete confirmation button
///
/// Shows "Delete" until `confirming` turns true, then "Are you sure?"
/// with confirm and dismiss buttons. Nothing is deleted without the
/// explicit confirm.
#[component]
pub fn DeleteConfirmButton(
    #[prop(into)] confirming: Signal<bool>,
    #[prop(into)] on_request: Callback<()>,
    #[prop(into)] on_confirm: Callback<()>,
    #[prop(into)] on_dismiss: Callback<()>,
) -> impl IntoView {
    view! {
        <Show when=move || !confirming.get()>
            <button
                class="delete-btn"
                on:click=move |ev| {
                    ev.stop_propagation();
                    on_request.run(());
                }
            >
                "Delete"
            </button>
        </Show>
        <Show when=move || confirming.get()>
            <span class="delete-confirm">
                <span class="delete-confirm-text">"Are you sure?"</span>
                <button
                    class="confirm-btn"
                    on:click=move |ev| {
                        ev.stop_propagation();
                        on_confirm.run(());
                    }
                >
                    "Delete"
                </button>
                <button
                    class="cancel-btn"
                    on:click=move |ev| {
                        ev.stop_propagation();
                        on_dismiss.run(());
                    }
                >
                    "Cancel"
                </button>
            </span>
        </Show>
    }
}
