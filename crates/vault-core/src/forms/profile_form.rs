//! Profile form

use super::{signed_in, FormMachine, FormPhase, Notice, SubmitOutcome};
use crate::api::{update_user_profile, ApiResponse};
use crate::domain::{ProfileUpdate, User};
use crate::repository::Backend;
use crate::session::Session;

#[derive(Default)]
pub struct ProfileForm {
    machine: FormMachine,
}

impl ProfileForm {
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

    /// Validate every field, then save; rejected submits report one error per field
    pub async fn submit(
        &self,
        backend: &dyn Backend,
        session: Option<&Session>,
        name: &str,
        email: &str,
        avatar_url: &str,
    ) -> SubmitOutcome<User> {
        if !self.machine.begin() {
            return SubmitOutcome::Ignored;
        }

        let update = match ProfileUpdate::parse(name, email, avatar_url) {
            Ok(update) => update,
            Err(errors) => {
                return self.machine.reject(
                    errors,
                    Notice::error("Invalid profile", "Please correct the highlighted fields"),
                )
            }
        };

        let Some(session) = signed_in(session) else {
            return self.machine.reject_signed_out("update your profile");
        };

        self.machine.submitting();
        match update_user_profile(backend, session.user_id(), update).await {
            ApiResponse::Ok(user) => self
                .machine
                .succeed(user, Notice::success("Profile updated", "Your profile has been saved")),
            ApiResponse::Err(message) => self.machine.fail(Notice::error("Failed to update profile", message)),
        }
    }
}
