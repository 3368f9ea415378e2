//! Thread Edit / Delete Controls
//!
//! Only the author of a thread may edit or delete it. Deleting takes two
//! steps: request, then confirm. Dismissing at any point issues nothing.

use super::Notice;
use crate::api::{delete_thread, update_thread, ApiResponse};
use crate::domain::{validate_content, Thread, ThreadPatch, Timestamp};
use crate::error::ValidationError;
use crate::repository::Backend;
use crate::session::Session;

/// Whether the signed-in user may edit or delete this thread
pub fn can_manage(thread: &Thread, session: Option<&Session>) -> bool {
    session.map(|s| thread.is_authored_by(s.user_id())).unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ThreadActions {
    #[default]
    Viewing,
    Editing { thread_id: String, draft: String },
    ConfirmingDelete { thread_id: String },
}

/// A backend call the controls decided to make
#[derive(Debug, Clone, PartialEq)]
pub enum ThreadCall {
    Update { thread_id: String, patch: ThreadPatch },
    Delete { thread_id: String },
}

impl ThreadActions {
    pub fn begin_edit(&mut self, thread: &Thread, session: Option<&Session>) -> bool {
        if !can_manage(thread, session) {
            return false;
        }
        *self = ThreadActions::Editing {
            thread_id: thread.id.clone(),
            draft: thread.content.clone(),
        };
        true
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        if let ThreadActions::Editing { draft, .. } = self {
            *draft = text.into();
        }
    }

    /// Finish an edit. Invalid content keeps the editor open.
    pub fn save(&mut self, now: Timestamp) -> Result<Option<ThreadCall>, ValidationError> {
        let ThreadActions::Editing { thread_id, draft } = self else {
            return Ok(None);
        };
        let content = validate_content(draft)?;
        let call = ThreadCall::Update {
            thread_id: thread_id.clone(),
            patch: ThreadPatch::content(content, now),
        };
        *self = ThreadActions::Viewing;
        Ok(Some(call))
    }

    pub fn request_delete(&mut self, thread: &Thread, session: Option<&Session>) -> bool {
        if !can_manage(thread, session) {
            return false;
        }
        *self = ThreadActions::ConfirmingDelete {
            thread_id: thread.id.clone(),
        };
        true
    }

    pub fn confirm_delete(&mut self) -> Option<ThreadCall> {
        let ThreadActions::ConfirmingDelete { thread_id } = self else {
            return None;
        };
        let call = ThreadCall::Delete {
            thread_id: thread_id.clone(),
        };
        *self = ThreadActions::Viewing;
        Some(call)
    }

    /// Cancel an edit or dismiss a delete confirmation
    pub fn dismiss(&mut self) {
        *self = ThreadActions::Viewing;
    }

    pub fn editing(&self, thread_id: &str) -> Option<&str> {
        match self {
            ThreadActions::Editing { thread_id: id, draft } if id == thread_id => Some(draft),
            _ => None,
        }
    }

    pub fn confirming(&self, thread_id: &str) -> bool {
        matches!(self, ThreadActions::ConfirmingDelete { thread_id: id } if id == thread_id)
    }
}

impl ThreadCall {
    pub async fn execute(self, backend: &dyn Backend) -> Notice {
        match self {
            ThreadCall::Update { thread_id, patch } => match update_thread(backend, &thread_id, patch).await {
                ApiResponse::Ok(_) => Notice::success("Thread updated", ""),
                ApiResponse::Err(message) => Notice::error("Failed to update thread", message),
            },
            ThreadCall::Delete { thread_id } => match delete_thread(backend, &thread_id).await {
                ApiResponse::Ok(()) => Notice::success("Thread deleted", ""),
                ApiResponse::Err(message) => Notice::error("Failed to delete thread", message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::demo_user;
    use chrono::Utc;

    fn thread_by(author: &str) -> Thread {
        Thread {
            id: "t1".into(),
            memory_id: "m1".into(),
            created_by: author.into(),
            content: "first".into(),
            parent_id: None,
            created_at: Utc::now(),
            updated_at: None,
            is_edited: false,
        }
    }

    #[test]
    fn test_only_author_may_manage() {
        let session = Session::new(demo_user(), None);
        let mine = thread_by(session.user_id());
        let theirs = thread_by("someone-else");

        let mut actions = ThreadActions::default();
        assert!(!actions.begin_edit(&theirs, Some(&session)));
        assert!(!actions.request_delete(&theirs, Some(&session)));
        assert!(!actions.begin_edit(&mine, None));
        assert!(actions.begin_edit(&mine, Some(&session)));
        assert_eq!(actions.editing("t1"), Some("first"));
    }

    #[test]
    fn test_dismissed_delete_issues_nothing() {
        let session = Session::new(demo_user(), None);
        let mine = thread_by(session.user_id());
        let mut actions = ThreadActions::default();
        assert!(actions.request_delete(&mine, Some(&session)));
        assert!(actions.confirming("t1"));
        actions.dismiss();
        assert_eq!(actions.confirm_delete(), None);
    }

    #[test]
    fn test_invalid_edit_stays_open() {
        let session = Session::new(demo_user(), None);
        let mine = thread_by(session.user_id());
        let mut actions = ThreadActions::default();
        actions.begin_edit(&mine, Some(&session));
        actions.set_draft("   ");
        assert!(actions.save(Utc::now()).is_err());
        assert!(actions.editing("t1").is_some());

        actions.set_draft("second");
        match actions.save(Utc::now()).unwrap() {
            Some(ThreadCall::Update { patch, .. }) => {
                assert!(patch.is_edited);
                assert_eq!(patch.content, "second");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(actions, ThreadActions::Viewing);
    }
}
