//! Form State Machines
//!
//! Browser-independent submit logic for every form in the app. Each form
//! walks `Idle -> Validating -> Submitting -> Succeeded | Failed`; a
//! validation rejection drops straight back to `Idle` without touching the
//! backend, and a submit while one is already in flight is ignored.
//!
//! Validation order is the same everywhere: required fields first, then
//! the signed-in user.

mod memory_form;
mod profile_form;
mod thread_actions;
mod thread_form;
mod vault_form;

use std::cell::Cell;

use crate::error::ValidationError;
use crate::session::Session;

pub use memory_form::{Attachment, CreateMemoryForm, MemoryDraft};
pub use profile_form::ProfileForm;
pub use thread_actions::{can_manage, ThreadActions, ThreadCall};
pub use thread_form::CreateThreadForm;
pub use vault_form::CreateVaultForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

impl FormPhase {
    /// Submit controls are disabled while busy
    pub fn is_busy(&self) -> bool {
        matches!(self, FormPhase::Validating | FormPhase::Submitting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
}

/// Transient user-facing message
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub tone: Tone,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tone: Tone::Success,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tone: Tone::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.tone == Tone::Error
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<T> {
    /// A submit was already in flight
    Ignored,
    /// Local validation failed; nothing was sent
    Rejected { errors: Vec<ValidationError>, notice: Notice },
    /// The record was created or updated; the caller resets its inputs
    Succeeded { value: T, notice: Notice },
    /// The backend call failed; inputs are kept for another try
    Failed { notice: Notice },
}

impl<T> SubmitOutcome<T> {
    pub fn notice(&self) -> Option<&Notice> {
        match self {
            SubmitOutcome::Ignored => None,
            SubmitOutcome::Rejected { notice, .. }
            | SubmitOutcome::Succeeded { notice, .. }
            | SubmitOutcome::Failed { notice } => Some(notice),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            SubmitOutcome::Succeeded { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, SubmitOutcome::Succeeded { .. })
    }
}

pub(crate) const AUTH_ERROR_TITLE: &str = "Authentication error";

/// Shared phase tracking; every transition is reported to the observer
#[derive(Default)]
pub struct FormMachine {
    phase: Cell<FormPhase>,
    observer: Option<Box<dyn Fn(FormPhase)>>,
}

impl FormMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(observer: impl Fn(FormPhase) + 'static) -> Self {
        Self {
            phase: Cell::new(FormPhase::Idle),
            observer: Some(Box::new(observer)),
        }
    }

    pub fn phase(&self) -> FormPhase {
        self.phase.get()
    }

    fn set(&self, phase: FormPhase) {
        self.phase.set(phase);
        if let Some(observer) = &self.observer {
            observer(phase);
        }
    }

    /// Enter validation; `false` when a submit is already running
    pub(crate) fn begin(&self) -> bool {
        if self.phase.get().is_busy() {
            tracing::debug!("submit ignored while another is in flight");
            return false;
        }
        self.set(FormPhase::Validating);
        true
    }

    pub(crate) fn reject<T>(&self, errors: Vec<ValidationError>, notice: Notice) -> SubmitOutcome<T> {
        self.set(FormPhase::Idle);
        SubmitOutcome::Rejected { errors, notice }
    }

    pub(crate) fn submitting(&self) {
        self.set(FormPhase::Submitting);
    }

    pub(crate) fn succeed<T>(&self, value: T, notice: Notice) -> SubmitOutcome<T> {
        self.set(FormPhase::Succeeded);
        SubmitOutcome::Succeeded { value, notice }
    }

    pub(crate) fn fail<T>(&self, notice: Notice) -> SubmitOutcome<T> {
        self.set(FormPhase::Failed);
        SubmitOutcome::Failed { notice }
    }

    /// Reject with the standard signed-out notice
    pub(crate) fn reject_signed_out<T>(&self, action: &str) -> SubmitOutcome<T> {
        self.reject(
            vec![ValidationError::new("user", "not signed in")],
            Notice::error(AUTH_ERROR_TITLE, format!("You must be signed in to {}", action)),
        )
    }
}

/// The signed-in session, if there is one
pub(crate) fn signed_in(session: Option<&Session>) -> Option<&Session> {
    session.filter(|s| !s.user.id.is_empty())
}
