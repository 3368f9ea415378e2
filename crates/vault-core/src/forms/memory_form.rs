//! Create Memory form

use std::future::Future;

use chrono::{NaiveDate, NaiveTime};

use super::{signed_in, FormMachine, FormPhase, Notice, SubmitOutcome};
use crate::api::{create_memory, object_path, upload_file, ApiResponse};
use crate::domain::{parse_tags, Memory, MemoryType, NewMemory, Timestamp};
use crate::error::ValidationError;
use crate::repository::Backend;
use crate::session::Session;

/// A file picked in the browser
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Raw field values as typed
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryDraft {
    pub title: String,
    pub story: String,
    pub kind: MemoryType,
    /// Comma-separated
    pub tags: String,
    pub unlock_date: Option<NaiveDate>,
    pub attachment: Option<Attachment>,
    /// URL of a voice note the recorder already uploaded
    pub recorded_url: Option<String>,
}

pub struct CreateMemoryForm {
    vault_id: String,
    machine: FormMachine,
}

impl CreateMemoryForm {
    pub fn new(vault_id: impl Into<String>) -> Self {
        Self {
            vault_id: vault_id.into(),
            machine: FormMachine::new(),
        }
    }

    pub fn with_observer(vault_id: impl Into<String>, observer: impl Fn(FormPhase) + 'static) -> Self {
        Self {
            vault_id: vault_id.into(),
            machine: FormMachine::with_observer(observer),
        }
    }

    pub fn phase(&self) -> FormPhase {
        self.machine.phase()
    }

    /// Upload any attachment, then insert the memory
    pub async fn submit(
        &self,
        backend: &dyn Backend,
        session: Option<&Session>,
        draft: MemoryDraft,
        now: Timestamp,
    ) -> SubmitOutcome<Memory> {
        self.submit_loading(backend, session, draft, async { Ok(None) }, now)
            .await
    }

    /// Like `submit`, but the attachment comes from `load`, which is only
    /// awaited once the form is busy and the draft has passed validation.
    /// A failed read fails the submit before anything is stored.
    pub async fn submit_loading<F>(
        &self,
        backend: &dyn Backend,
        session: Option<&Session>,
        mut draft: MemoryDraft,
        load: F,
        now: Timestamp,
    ) -> SubmitOutcome<Memory>
    where
        F: Future<Output = Result<Option<Attachment>, String>>,
    {
        if !self.machine.begin() {
            return SubmitOutcome::Ignored;
        }

        let mut missing = Vec::new();
        if draft.title.trim().is_empty() {
            missing.push(ValidationError::new("title", "Title is required"));
        }
        if draft.story.trim().is_empty() {
            missing.push(ValidationError::new("story", "Story is required"));
        }
        if !missing.is_empty() {
            return self.machine.reject(
                missing,
                Notice::error("Required fields missing", "Please fill in title and story"),
            );
        }

        let Some(session) = signed_in(session) else {
            return self.machine.reject_signed_out("create a memory");
        };

        if let Some(date) = draft.unlock_date {
            if date <= now.date_naive() {
                return self.machine.reject(
                    vec![ValidationError::new("unlock_date", "Unlock date must be in the future")],
                    Notice::error("Invalid unlock date", "Choose a date after today"),
                );
            }
        }

        self.machine.submitting();

        if self.needs_attachment(&draft) {
            match load.await {
                Ok(Some(attachment)) => draft.attachment = Some(attachment),
                Ok(None) => {}
                Err(message) => return self.machine.fail(Notice::error("Could not read file", message)),
            }
        }

        let media_url = match self.media_url(backend, &draft, now).await {
            Ok(url) => url,
            Err(message) => return self.machine.fail(Notice::error("Failed to create memory", message)),
        };

        let memory = NewMemory {
            vault_id: self.vault_id.clone(),
            title: draft.title.trim().to_string(),
            story: draft.story.trim().to_string(),
            kind: draft.kind,
            media_url,
            created_by: session.user_id().to_string(),
            tags: parse_tags(&draft.tags),
            unlock_date: draft
                .unlock_date
                .map(|date| date.and_time(NaiveTime::MIN).and_utc()),
        };

        match create_memory(backend, memory).await {
            ApiResponse::Ok(memory) => self.machine.succeed(
                memory,
                Notice::success("Memory created", "Your memory has been added to the vault"),
            ),
            ApiResponse::Err(message) => self.machine.fail(Notice::error("Failed to create memory", message)),
        }
    }

    fn needs_attachment(&self, draft: &MemoryDraft) -> bool {
        draft.kind.has_media() && draft.attachment.is_none() && draft.recorded_url.is_none()
    }

    async fn media_url(&self, backend: &dyn Backend, draft: &MemoryDraft, now: Timestamp) -> Result<Option<String>, String> {
        let Some(bucket) = draft.kind.bucket() else {
            return Ok(None);
        };
        if draft.kind == MemoryType::Voice {
            if let Some(url) = &draft.recorded_url {
                return Ok(Some(url.clone()));
            }
        }
        let Some(file) = &draft.attachment else {
            return Ok(None);
        };
        let path = object_path(&self.vault_id, now.timestamp_millis(), &file.file_name);
        upload_file(backend, bucket, &path, file.content_type.as_deref(), file.bytes.clone())
            .await
            .into_result()
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Table;
    use crate::repository::{InMemoryBackend, Operation};
    use crate::session::demo_user;
    use chrono::{Duration, Utc};

    fn session() -> Session {
        Session::new(demo_user(), None)
    }

    #[tokio::test]
    async fn test_missing_fields_come_before_auth() {
        let backend = InMemoryBackend::new();
        let form = CreateMemoryForm::new("v1");
        let outcome = form
            .submit(&backend, None, MemoryDraft::default(), Utc::now())
            .await;
        assert_eq!(outcome.notice().unwrap().title, "Required fields missing");
        assert_eq!(form.phase(), FormPhase::Idle);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_signed_out_rejected() {
        let backend = InMemoryBackend::new();
        let form = CreateMemoryForm::new("v1");
        let draft = MemoryDraft {
            title: "t".into(),
            story: "s".into(),
            ..MemoryDraft::default()
        };
        let outcome = form.submit(&backend, None, draft, Utc::now()).await;
        assert_eq!(outcome.notice().unwrap().title, "Authentication error");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_past_unlock_date_rejected() {
        let backend = InMemoryBackend::new();
        let form = CreateMemoryForm::new("v1");
        let now = Utc::now();
        let draft = MemoryDraft {
            title: "t".into(),
            story: "s".into(),
            unlock_date: Some(now.date_naive()),
            ..MemoryDraft::default()
        };
        let outcome = form.submit(&backend, Some(&session()), draft, now).await;
        assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_photo_upload_precedes_insert() {
        let backend = InMemoryBackend::new();
        let form = CreateMemoryForm::new("v1");
        let now = Utc::now();
        let draft = MemoryDraft {
            title: "Beach Day".into(),
            story: "Sand everywhere.".into(),
            kind: MemoryType::Photo,
            tags: "summer, beach".into(),
            unlock_date: Some((now + Duration::days(30)).date_naive()),
            attachment: Some(Attachment {
                file_name: "beach.jpg".into(),
                content_type: None,
                bytes: vec![1, 2, 3],
            }),
            recorded_url: None,
        };
        let outcome = form.submit(&backend, Some(&session()), draft, now).await;
        let memory = outcome.value().unwrap();

        let expected_path = format!("v1/{}-beach.jpg", now.timestamp_millis());
        assert_eq!(
            memory.media_url.as_deref(),
            Some(format!("memory://storage/photos/{}", expected_path).as_str())
        );
        assert_eq!(memory.tags, vec!["summer", "beach"]);
        assert!(memory.is_locked(now));

        let ops: Vec<_> = backend.calls().iter().map(|c| c.op).collect();
        assert_eq!(ops, vec![Operation::Upload, Operation::Insert]);
        assert_eq!(form.phase(), FormPhase::Succeeded);
    }

    #[tokio::test]
    async fn test_upload_failure_skips_insert() {
        let backend = InMemoryBackend::new();
        backend.fail_next(
            Operation::Upload,
            None,
            crate::error::BackendError::Network("offline".into()),
        );
        let form = CreateMemoryForm::new("v1");
        let draft = MemoryDraft {
            title: "t".into(),
            story: "s".into(),
            kind: MemoryType::Photo,
            attachment: Some(Attachment {
                file_name: "p.png".into(),
                content_type: Some("image/png".into()),
                bytes: vec![9],
            }),
            ..MemoryDraft::default()
        };
        let outcome = form.submit(&backend, Some(&session()), draft, Utc::now()).await;
        assert_eq!(outcome.notice().unwrap().title, "Failed to create memory");
        assert_eq!(backend.count(Operation::Insert, Table::Memories), 0);
        assert_eq!(form.phase(), FormPhase::Failed);
    }

    fn photo_draft() -> MemoryDraft {
        MemoryDraft {
            title: "Beach Day".into(),
            story: "Sand everywhere.".into(),
            kind: MemoryType::Photo,
            ..MemoryDraft::default()
        }
    }

    #[tokio::test]
    async fn test_unreadable_file_stores_nothing() {
        let backend = InMemoryBackend::new();
        let form = CreateMemoryForm::new("v1");
        let outcome = form
            .submit_loading(
                &backend,
                Some(&session()),
                photo_draft(),
                async { Err("NotReadableError".to_string()) },
                Utc::now(),
            )
            .await;
        let notice = outcome.notice().unwrap();
        assert_eq!(notice.title, "Could not read file");
        assert!(notice.is_error());
        assert!(backend.calls().is_empty());
        assert_eq!(form.phase(), FormPhase::Failed);
    }

    #[tokio::test]
    async fn test_second_submit_during_file_read_is_ignored() {
        let backend = InMemoryBackend::new();
        let form = CreateMemoryForm::new("v1");
        let (tx, rx) = tokio::sync::oneshot::channel::<Attachment>();

        let first_session = session();
        let first = form.submit_loading(
            &backend,
            Some(&first_session),
            photo_draft(),
            async move { Ok(rx.await.ok()) },
            Utc::now(),
        );
        let second = async {
            let outcome = form.submit(&backend, Some(&session()), photo_draft(), Utc::now()).await;
            let _ = tx.send(Attachment {
                file_name: "beach.jpg".into(),
                content_type: Some("image/jpeg".into()),
                bytes: vec![1, 2, 3],
            });
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(second, SubmitOutcome::Ignored));
        assert!(first.value().unwrap().media_url.is_some());
        assert_eq!(backend.count(Operation::Insert, Table::Memories), 1);
        let uploads = backend.calls().iter().filter(|c| c.op == Operation::Upload).count();
        assert_eq!(uploads, 1);
    }

    #[tokio::test]
    async fn test_recorded_voice_url_is_used_as_is() {
        let backend = InMemoryBackend::new();
        let form = CreateMemoryForm::new("v1");
        let draft = MemoryDraft {
            title: "Lullaby".into(),
            story: "Sung every night.".into(),
            kind: MemoryType::Voice,
            recorded_url: Some("https://cdn.example/voice.webm".into()),
            ..MemoryDraft::default()
        };
        let memory = form
            .submit(&backend, Some(&session()), draft, Utc::now())
            .await
            .value()
            .cloned()
            .unwrap();
        assert_eq!(memory.media_url.as_deref(), Some("https://cdn.example/voice.webm"));
        assert!(backend.object("audio", "anything").is_none());
        assert_eq!(backend.calls().len(), 1);
    }
}
