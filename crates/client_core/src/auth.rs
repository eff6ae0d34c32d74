use std::sync::Arc;

use shared::protocol::{AuthRequest, UserIdentity};
use tracing::{info, warn};

use crate::{
    boundary::{Notice, Notifier, Screen},
    error::{ClientError, ClientResult, RemoteFailure, ValidationError},
    gating::{Gate, GateState},
    store::Store,
    transport::{routes, ChatApi},
};

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    Ok(())
}

pub fn validate_signup(email: &str, password: &str, confirm: &str) -> Result<(), ValidationError> {
    validate_login(email, password)?;
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthLabel {
    Weak,
    Medium,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordStrength {
    /// 0 through [`PasswordStrength::MAX_SCORE`].
    pub score: u8,
}

impl PasswordStrength {
    pub const MAX_SCORE: u8 = 5;

    pub fn label(&self) -> StrengthLabel {
        match self.score {
            0..=2 => StrengthLabel::Weak,
            3..=4 => StrengthLabel::Medium,
            _ => StrengthLabel::Strong,
        }
    }
}

pub fn password_strength(password: &str) -> PasswordStrength {
    let length = password.chars().count();
    let checks = [
        length > 6,
        length > 10,
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    PasswordStrength {
        score: checks.iter().filter(|passed| **passed).count() as u8,
    }
}

#[derive(Clone)]
pub struct AuthFlow {
    store: Store,
    api: Arc<dyn ChatApi>,
    gate: Gate,
    notifier: Arc<dyn Notifier>,
}

impl AuthFlow {
    pub fn new(
        store: Store,
        api: Arc<dyn ChatApi>,
        gate: Gate,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            api,
            gate,
            notifier,
        }
    }

    fn rejected(&self, err: ValidationError) -> ClientError {
        self.notifier.notify(&Notice::Invalid(err));
        ClientError::Validation(err)
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<GateState> {
        validate_login(email, password).map_err(|err| self.rejected(err))?;

        let request = AuthRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let user = match self.api.login(&request).await.and_then(require_id(routes::LOGIN)) {
            Ok(user) => user,
            Err(failure) => {
                warn!("login failed: {failure}");
                self.notifier.notify(&Notice::LoginFailed);
                return Err(failure.into());
            }
        };

        info!(user_id = %user.id, profile_setup = user.profile_setup_complete, "logged in");
        self.store.begin_session(user).await;
        let state = self.store.gate().await;
        self.gate.enter().await;
        Ok(state)
    }

    /// Creates an account; a new account always continues on the profile
    /// editor.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> ClientResult<GateState> {
        validate_signup(email, password, confirm_password).map_err(|err| self.rejected(err))?;

        let request = AuthRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let user = match self
            .api
            .signup(&request)
            .await
            .and_then(require_id(routes::SIGNUP))
        {
            Ok(user) => user,
            Err(failure) => {
                warn!("signup failed: {failure}");
                self.notifier.notify(&Notice::SignupFailed);
                return Err(failure.into());
            }
        };

        info!(user_id = %user.id, "signed up");
        self.store.begin_session(user).await;
        let state = self.store.gate().await;
        self.gate.navigate(Screen::Profile).await;
        Ok(state)
    }

    /// Picks up an existing server-side session, if the cookie still holds
    /// one. A missing session is the normal state of a first visit and is
    /// not reported.
    pub async fn restore_session(&self) -> GateState {
        let epoch = self.store.session_epoch().await;
        match self
            .api
            .user_info()
            .await
            .and_then(require_id(routes::USER_INFO))
        {
            Ok(user) => {
                let user_id = user.id.clone();
                // A login that completed meanwhile is newer than this answer.
                if self.store.begin_session_in(epoch, user).await {
                    info!(%user_id, "session restored");
                }
            }
            Err(failure) => info!("no session to restore: {failure}"),
        }
        self.store.gate().await
    }

    /// Clears all local state first, then tells the server. Never fails.
    pub async fn logout(&self) {
        self.store.clear().await;
        self.gate.navigate(Screen::Auth).await;
        if let Err(failure) = self.api.logout().await {
            warn!("server logout failed after local state was cleared: {failure}");
        }
    }
}

fn require_id(
    endpoint: &'static str,
) -> impl FnOnce(UserIdentity) -> Result<UserIdentity, RemoteFailure> {
    move |user| {
        if user.id.as_str().is_empty() {
            Err(RemoteFailure::malformed(endpoint, "user record carries no id"))
        } else {
            Ok(user)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_requires_email_then_password() {
        assert_eq!(validate_login("", ""), Err(ValidationError::EmailRequired));
        assert_eq!(
            validate_login("a@x.com", ""),
            Err(ValidationError::PasswordRequired)
        );
        assert_eq!(validate_login("a@x.com", "secret1"), Ok(()));
    }

    #[test]
    fn signup_requires_matching_confirmation() {
        assert_eq!(
            validate_signup("a@x.com", "secret1", "secret2"),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(validate_signup("a@x.com", "secret1", "secret1"), Ok(()));
    }

    #[test]
    fn password_strength_scores() {
        assert_eq!(password_strength("").score, 0);
        assert_eq!(password_strength("abc").label(), StrengthLabel::Weak);
        // length > 6, digit
        assert_eq!(password_strength("secret12").score, 2);
        // length > 6, uppercase, digit
        assert_eq!(password_strength("Secret12").label(), StrengthLabel::Medium);
        assert_eq!(password_strength("Secret12!long").score, PasswordStrength::MAX_SCORE);
        assert_eq!(password_strength("Secret12!long").label(), StrengthLabel::Strong);
    }
}
