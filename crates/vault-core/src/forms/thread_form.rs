//! Create Thread form

use super::{signed_in, FormMachine, FormPhase, Notice, SubmitOutcome};
use crate::api::{create_thread, ApiResponse};
use crate::domain::{can_write, validate_content, NewThread, Role, Thread};
use crate::error::ValidationError;
use crate::repository::Backend;
use crate::session::Session;

pub struct CreateThreadForm {
    memory_id: String,
    machine: FormMachine,
}

impl CreateThreadForm {
    pub fn new(memory_id: impl Into<String>) -> Self {
        Self {
            memory_id: memory_id.into(),
            machine: FormMachine::new(),
        }
    }

    pub fn with_observer(memory_id: impl Into<String>, observer: impl Fn(FormPhase) + 'static) -> Self {
        Self {
            memory_id: memory_id.into(),
            machine: FormMachine::with_observer(observer),
        }
    }

    pub fn phase(&self) -> FormPhase {
        self.machine.phase()
    }

    /// Post a new thread; viewers and non-members are turned away locally
    pub async fn submit(
        &self,
        backend: &dyn Backend,
        session: Option<&Session>,
        role: Option<Role>,
        content: &str,
    ) -> SubmitOutcome<Thread> {
        if !self.machine.begin() {
            return SubmitOutcome::Ignored;
        }

        let content = match validate_content(content) {
            Ok(content) => content,
            Err(e) => {
                let message = e.message.clone();
                return self.machine.reject(vec![e], Notice::error("Invalid thread", message));
            }
        };

        let Some(session) = signed_in(session) else {
            return self.machine.reject_signed_out("start a thread");
        };

        if !can_write(role) {
            return self.machine.reject(
                vec![ValidationError::new("role", "owner or editor role required")],
                Notice::error("Permission denied", "Only owners and editors can post in this vault"),
            );
        }

        self.machine.submitting();
        let thread = NewThread {
            memory_id: self.memory_id.clone(),
            created_by: session.user_id().to_string(),
            content,
            parent_id: None,
        };
        match create_thread(backend, thread).await {
            ApiResponse::Ok(thread) => self
                .machine
                .succeed(thread, Notice::success("Thread created successfully", "")),
            ApiResponse::Err(message) => self.machine.fail(Notice::error("Failed to create thread", message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Table;
    use crate::repository::{InMemoryBackend, Operation};
    use crate::session::demo_user;

    #[tokio::test]
    async fn test_viewer_cannot_post() {
        let backend = InMemoryBackend::new();
        let form = CreateThreadForm::new("m1");
        let session = Session::new(demo_user(), None);
        let outcome = form
            .submit(&backend, Some(&session), Some(Role::Viewer), "hello")
            .await;
        assert_eq!(outcome.notice().unwrap().title, "Permission denied");
        assert_eq!(backend.count(Operation::Insert, Table::Threads), 0);
    }

    #[tokio::test]
    async fn test_editor_posts_trimmed_content() {
        let backend = InMemoryBackend::new();
        let form = CreateThreadForm::new("m1");
        let session = Session::new(demo_user(), None);
        let outcome = form
            .submit(&backend, Some(&session), Some(Role::Editor), "  lovely photo \n")
            .await;
        let thread = outcome.value().unwrap();
        assert_eq!(thread.content, "lovely photo");
        assert_eq!(thread.created_by, session.user_id());
        assert!(!thread.is_edited);
    }

    #[tokio::test]
    async fn test_blank_content_rejected_before_auth() {
        let backend = InMemoryBackend::new();
        let form = CreateThreadForm::new("m1");
        let outcome = form.submit(&backend, None, None, "   ").await;
        assert_eq!(outcome.notice().unwrap().title, "Invalid thread");
        assert!(backend.calls().is_empty());
    }
}
