use std::sync::Arc;

use shared::protocol::{UpdateProfileRequest, UserIdentity};
use tracing::{info, warn};

use crate::{
    boundary::{Confirmer, Notice, Notifier, Screen},
    error::{ClientError, ClientResult, ValidationError},
    gating::Gate,
    store::Store,
    transport::ChatApi,
    types::AvatarUpload,
};

pub const REMOVE_AVATAR_PROMPT: &str = "Are you sure you want to delete your profile image?";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    pub first_name: String,
    pub last_name: String,
    pub color_index: u32,
}

impl ProfileDraft {
    /// Names and color are only carried over once the profile was set up;
    /// a fresh account starts from an empty form.
    pub fn from_identity(identity: &UserIdentity) -> Self {
        if !identity.profile_setup_complete {
            return Self::default();
        }
        Self {
            first_name: identity.first_name.clone().unwrap_or_default(),
            last_name: identity.last_name.clone().unwrap_or_default(),
            color_index: identity.color_index.unwrap_or_default(),
        }
    }
}

pub fn validate_profile(
    first_name: &str,
    last_name: &str,
    color_index: u32,
) -> Result<UpdateProfileRequest, ValidationError> {
    let first_name = first_name.trim();
    if first_name.is_empty() {
        return Err(ValidationError::FirstNameRequired);
    }
    let last_name = last_name.trim();
    if last_name.is_empty() {
        return Err(ValidationError::LastNameRequired);
    }
    Ok(UpdateProfileRequest {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        color: color_index,
    })
}

/// Writes identity edits to the server and, only on success, through to the
/// session store. Name, color and avatar edits fail independently.
#[derive(Clone)]
pub struct ProfilePipeline {
    store: Store,
    api: Arc<dyn ChatApi>,
    gate: Gate,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
}

impl ProfilePipeline {
    pub fn new(
        store: Store,
        api: Arc<dyn ChatApi>,
        gate: Gate,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        Self {
            store,
            api,
            gate,
            notifier,
            confirmer,
        }
    }

    async fn authenticated_epoch(&self) -> ClientResult<u64> {
        self.store
            .read(|state| {
                state
                    .session()
                    .is_authenticated()
                    .then(|| state.session().epoch())
            })
            .await
            .ok_or(ClientError::NotAuthenticated)
    }

    /// Saves names and color. The stored record is the one the server sends
    /// back, which also marks the profile as set up.
    pub async fn update_profile(
        &self,
        first_name: &str,
        last_name: &str,
        color_index: u32,
    ) -> ClientResult<UserIdentity> {
        let request = validate_profile(first_name, last_name, color_index).map_err(|err| {
            self.notifier.notify(&Notice::Invalid(err));
            ClientError::Validation(err)
        })?;
        let epoch = self.authenticated_epoch().await?;

        let user = match self.api.update_profile(&request).await {
            Ok(user) => user,
            Err(failure) => {
                warn!("profile update failed: {failure}");
                self.notifier.notify(&Notice::ProfileUpdateFailed);
                return Err(failure.into());
            }
        };

        if !self.store.replace_session_in(epoch, user.clone()).await {
            warn!("profile update answered after the session ended; ignoring");
            return Err(ClientError::SessionSuperseded);
        }
        info!(user_id = %user.id, "profile updated");
        self.notifier.notify(&Notice::ProfileUpdated);
        self.gate.navigate(Screen::Chat).await;
        Ok(user)
    }

    pub async fn set_avatar(&self, upload: AvatarUpload) -> ClientResult<String> {
        let epoch = self.authenticated_epoch().await?;
        let size = upload.bytes.len();

        let image = match self.api.add_profile_image(upload).await {
            Ok(image) => image,
            Err(failure) => {
                warn!(size, "avatar upload failed: {failure}");
                self.notifier.notify(&Notice::AvatarUploadFailed);
                return Err(failure.into());
            }
        };

        let avatar_ref = image.clone();
        if !self
            .store
            .update_session_in(epoch, move |user| user.with_avatar(Some(avatar_ref)))
            .await
        {
            return Err(ClientError::SessionSuperseded);
        }
        info!(size, image = %image, "avatar updated");
        self.notifier.notify(&Notice::AvatarUpdated);
        Ok(image)
    }

    /// Removes the avatar after the user confirmed. Returns `false` when the
    /// prompt was declined.
    pub async fn clear_avatar(&self) -> ClientResult<bool> {
        let epoch = self.authenticated_epoch().await?;
        if !self.confirmer.confirm(REMOVE_AVATAR_PROMPT) {
            return Ok(false);
        }

        if let Err(failure) = self.api.remove_profile_image().await {
            warn!("avatar removal failed: {failure}");
            self.notifier.notify(&Notice::AvatarRemoveFailed);
            return Err(failure.into());
        }

        if !self
            .store
            .update_session_in(epoch, |user| user.with_avatar(None))
            .await
        {
            return Err(ClientError::SessionSuperseded);
        }
        info!("avatar removed");
        self.notifier.notify(&Notice::AvatarRemoved);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_trims_names() {
        let request = validate_profile("  Ada ", "Lovelace\n", 2).expect("valid");
        assert_eq!(
            request,
            UpdateProfileRequest {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                color: 2,
            }
        );
    }

    #[test]
    fn validation_rejects_blank_names() {
        assert_eq!(
            validate_profile("", "Doe", 2),
            Err(ValidationError::FirstNameRequired)
        );
        assert_eq!(
            validate_profile("Jane", "   ", 2),
            Err(ValidationError::LastNameRequired)
        );
    }

    #[test]
    fn draft_is_empty_until_profile_is_set_up() {
        let mut user = UserIdentity::new("u1", "a@x.com");
        user.first_name = Some("Ada".into());
        user.color_index = Some(3);
        assert_eq!(ProfileDraft::from_identity(&user), ProfileDraft::default());

        user.profile_setup_complete = true;
        let draft = ProfileDraft::from_identity(&user);
        assert_eq!(draft.first_name, "Ada");
        assert_eq!(draft.last_name, "");
        assert_eq!(draft.color_index, 3);
    }
}
