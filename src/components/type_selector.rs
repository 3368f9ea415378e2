//! Type Selector Component
//!
//! Memory type selector buttons.

use leptos::prelude::*;
use vault_core::domain::MemoryType;

#[component]
pub fn TypeSelector(
    current_type: ReadSignal<MemoryType>,
    on_change: impl Fn(MemoryType) + Copy + 'static,
) -> impl IntoView {
    view! {
        <div class="type-selector">
            {MemoryType::ALL.iter().map(|kind| {
                let kind = *kind;
                let is_selected = move || current_type.get() == kind;
                view! {
                    <button
                        type="button"
                        class=move || if is_selected() { "type-btn active" } else { "type-btn" }
                        on:click=move |_| on_change(kind)
                    >
                        {kind.label()}
                    </button>
                }
            }).collect_view()}
        </div>
    }
}
