//! Create Vault dialog

use super::{signed_in, FormMachine, FormPhase, Notice, SubmitOutcome};
use crate::api::{create_vault, ApiResponse};
use crate::domain::{NewVault, Vault};
use crate::error::ValidationError;
use crate::repository::Backend;
use crate::session::Session;

#[derive(Default)]
pub struct CreateVaultForm {
    machine: FormMachine,
}

impl CreateVaultForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(observer: impl Fn(FormPhase) + 'static) -> Self {
        Self {
            machine: FormMachine::with_observer(observer),
        }
    }

    pub fn phase(&self) -> FormPhase {
        self.machine.phase()
    }

    /// Create a vault with the default theme, owned by the signed-in user
    pub async fn submit(&self, backend: &dyn Backend, session: Option<&Session>, name: &str) -> SubmitOutcome<Vault> {
        if !self.machine.begin() {
            return SubmitOutcome::Ignored;
        }

        let name = name.trim();
        if name.is_empty() {
            return self.machine.reject(
                vec![ValidationError::new("name", "Vault name is required")],
                Notice::error("Vault name required", "Please enter a name for your vault"),
            );
        }

        let Some(session) = signed_in(session) else {
            return self.machine.reject_signed_out("create a vault");
        };

        self.machine.submitting();
        match create_vault(backend, NewVault::new(name, session.user_id())).await {
            ApiResponse::Ok(vault) => {
                let description = format!("\"{}\" has been created successfully", vault.name);
                self.machine.succeed(vault, Notice::success("Vault created", description))
            }
            ApiResponse::Err(message) => self.machine.fail(Notice::error("Failed to create vault", message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryBackend;
    use crate::session::demo_user;

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let backend = InMemoryBackend::new();
        let form = CreateVaultForm::new();
        let outcome = form.submit(&backend, None, "  ").await;
        assert_eq!(outcome.notice().unwrap().title, "Vault name required");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_success_notice_names_vault() {
        let backend = InMemoryBackend::new();
        let form = CreateVaultForm::new();
        let session = Session::new(demo_user(), None);
        let outcome = form.submit(&backend, Some(&session), " Family Stories ").await;
        assert_eq!(
            outcome.notice().unwrap().description,
            "\"Family Stories\" has been created successfully"
        );
        assert_eq!(outcome.value().unwrap().theme, vec!["sepia"]);
    }
}
