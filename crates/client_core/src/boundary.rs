//! Collaborators the state core drives but does not implement: screen
//! navigation, user-facing notices and confirmation prompts.

use std::fmt;

use shared::domain::ChatKind;
use tracing::{debug, info, warn};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Auth,
    Profile,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Outcome classification handed to the notifier. `Display` gives the
/// default English wording; presentation layers are free to ignore it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Invalid(ValidationError),
    LoginFailed,
    SignupFailed,
    ProfileSetupRequired,
    ProfileUpdated,
    ProfileUpdateFailed,
    AvatarUpdated,
    AvatarUploadFailed,
    AvatarRemoved,
    AvatarRemoveFailed,
    FetchFailed(ChatKind),
}

impl Notice {
    pub fn level(&self) -> NoticeLevel {
        match self {
            Notice::ProfileUpdated | Notice::AvatarUpdated | Notice::AvatarRemoved => {
                NoticeLevel::Success
            }
            _ => NoticeLevel::Error,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Invalid(err) => write!(f, "{err}"),
            Notice::LoginFailed => f.write_str("Login failed. Please check your credentials."),
            Notice::SignupFailed => f.write_str("Signup failed. Please try again."),
            Notice::ProfileSetupRequired => f.write_str("Please setup profile to continue."),
            Notice::ProfileUpdated => f.write_str("Profile Updated Successfully."),
            Notice::ProfileUpdateFailed => {
                f.write_str("Failed to update profile. Please try again.")
            }
            Notice::AvatarUpdated => f.write_str("Image updated successfully."),
            Notice::AvatarUploadFailed => f.write_str("Failed to upload image. Please try again."),
            Notice::AvatarRemoved => f.write_str("Image Removed Successfully."),
            Notice::AvatarRemoveFailed => f.write_str("Failed to remove image. Please try again."),
            Notice::FetchFailed(ChatKind::Contact) => f.write_str("Failed to load contacts."),
            Notice::FetchFailed(ChatKind::Channel) => f.write_str("Failed to load channels."),
        }
    }
}

pub trait Navigator: Send + Sync {
    fn go_to(&self, screen: Screen);
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Navigator for headless use: records the destination in the log only.
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn go_to(&self, screen: Screen) {
        debug!(?screen, "navigate");
    }
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.level() {
            NoticeLevel::Success => info!(%notice, "notice"),
            NoticeLevel::Error => warn!(%notice, "notice"),
        }
    }
}

pub struct FixedConfirmer(pub bool);

impl Confirmer for FixedConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        debug!(prompt, answer = self.0, "confirmation");
        self.0
    }
}
