use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::protocol::{
    AuthRequest, Channel, ChannelsResponse, Contact, ContactsResponse, ProfileImageResponse,
    UpdateProfileRequest, UpdateProfileResponse, UserEnvelope, UserIdentity,
};
use tracing::debug;
use url::Url;

use crate::{error::RemoteFailure, settings::ClientSettings, types::AvatarUpload};

pub mod routes {
    pub const LOGIN: &str = "api/auth/login";
    pub const SIGNUP: &str = "api/auth/signup";
    pub const USER_INFO: &str = "api/auth/user-info";
    pub const LOGOUT: &str = "api/auth/logout";
    pub const UPDATE_PROFILE: &str = "api/auth/update-profile";
    pub const ADD_PROFILE_IMAGE: &str = "api/auth/add-profile-image";
    pub const REMOVE_PROFILE_IMAGE: &str = "api/auth/remove-profile-image";
    pub const CONTACTS_WITH_MESSAGES: &str = "api/contacts/get-contacts-for-dm";
    pub const USER_CHANNELS: &str = "api/channel/get-user-channels";
}

pub const PROFILE_IMAGE_FIELD: &str = "profile-image";

/// REST surface of the chat server as the state core consumes it. Every
/// non-success outcome collapses into a [`RemoteFailure`].
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn login(&self, request: &AuthRequest) -> Result<UserIdentity, RemoteFailure>;
    async fn signup(&self, request: &AuthRequest) -> Result<UserIdentity, RemoteFailure>;
    async fn user_info(&self) -> Result<UserIdentity, RemoteFailure>;
    async fn logout(&self) -> Result<(), RemoteFailure>;
    async fn update_profile(
        &self,
        request: &UpdateProfileRequest,
    ) -> Result<UserIdentity, RemoteFailure>;
    /// Returns the server-side reference of the stored image.
    async fn add_profile_image(&self, upload: AvatarUpload) -> Result<String, RemoteFailure>;
    async fn remove_profile_image(&self) -> Result<(), RemoteFailure>;
    async fn contacts_with_messages(&self) -> Result<Vec<Contact>, RemoteFailure>;
    async fn user_channels(&self) -> Result<Vec<Channel>, RemoteFailure>;
}

/// Stand-in used before a server is configured: every call fails as a
/// network error.
pub struct MissingChatApi;

#[async_trait]
impl ChatApi for MissingChatApi {
    async fn login(&self, _request: &AuthRequest) -> Result<UserIdentity, RemoteFailure> {
        Err(unavailable(routes::LOGIN))
    }

    async fn signup(&self, _request: &AuthRequest) -> Result<UserIdentity, RemoteFailure> {
        Err(unavailable(routes::SIGNUP))
    }

    async fn user_info(&self) -> Result<UserIdentity, RemoteFailure> {
        Err(unavailable(routes::USER_INFO))
    }

    async fn logout(&self) -> Result<(), RemoteFailure> {
        Err(unavailable(routes::LOGOUT))
    }

    async fn update_profile(
        &self,
        _request: &UpdateProfileRequest,
    ) -> Result<UserIdentity, RemoteFailure> {
        Err(unavailable(routes::UPDATE_PROFILE))
    }

    async fn add_profile_image(&self, _upload: AvatarUpload) -> Result<String, RemoteFailure> {
        Err(unavailable(routes::ADD_PROFILE_IMAGE))
    }

    async fn remove_profile_image(&self) -> Result<(), RemoteFailure> {
        Err(unavailable(routes::REMOVE_PROFILE_IMAGE))
    }

    async fn contacts_with_messages(&self) -> Result<Vec<Contact>, RemoteFailure> {
        Err(unavailable(routes::CONTACTS_WITH_MESSAGES))
    }

    async fn user_channels(&self) -> Result<Vec<Channel>, RemoteFailure> {
        Err(unavailable(routes::USER_CHANNELS))
    }
}

fn unavailable(endpoint: &'static str) -> RemoteFailure {
    RemoteFailure::network(endpoint, "chat server transport is unavailable")
}

/// reqwest-backed [`ChatApi`]. Authentication rides on the server's session
/// cookie, so the client keeps a cookie store.
pub struct HttpChatApi {
    http: Client,
    base: Url,
}

impl HttpChatApi {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let base = settings.server_base_url()?;
        let http = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, route: &'static str) -> Result<Url, RemoteFailure> {
        self.base
            .join(route)
            .map_err(|err| RemoteFailure::network(route, format!("invalid endpoint url: {err}")))
    }

    async fn send(
        &self,
        route: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, RemoteFailure> {
        let response = request
            .send()
            .await
            .map_err(|err| RemoteFailure::from_reqwest(route, err))?;
        let status = response.status();
        debug!(route, status = status.as_u16(), "chat api response");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RemoteFailure::from_status(route, status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        route: &'static str,
        request: RequestBuilder,
    ) -> Result<T, RemoteFailure> {
        self.send(route, request)
            .await?
            .json::<T>()
            .await
            .map_err(|err| RemoteFailure::malformed(route, err.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, route: &'static str) -> Result<T, RemoteFailure> {
        let url = self.endpoint(route)?;
        self.send_json(route, self.http.get(url)).await
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn login(&self, request: &AuthRequest) -> Result<UserIdentity, RemoteFailure> {
        let url = self.endpoint(routes::LOGIN)?;
        let body: UserEnvelope = self
            .send_json(routes::LOGIN, self.http.post(url).json(request))
            .await?;
        Ok(body.user)
    }

    async fn signup(&self, request: &AuthRequest) -> Result<UserIdentity, RemoteFailure> {
        let url = self.endpoint(routes::SIGNUP)?;
        let body: UserEnvelope = self
            .send_json(routes::SIGNUP, self.http.post(url).json(request))
            .await?;
        Ok(body.user)
    }

    async fn user_info(&self) -> Result<UserIdentity, RemoteFailure> {
        let body: UserEnvelope = self.get(routes::USER_INFO).await?;
        Ok(body.user)
    }

    async fn logout(&self) -> Result<(), RemoteFailure> {
        let url = self.endpoint(routes::LOGOUT)?;
        self.send(routes::LOGOUT, self.http.post(url)).await?;
        Ok(())
    }

    async fn update_profile(
        &self,
        request: &UpdateProfileRequest,
    ) -> Result<UserIdentity, RemoteFailure> {
        let url = self.endpoint(routes::UPDATE_PROFILE)?;
        let body: UpdateProfileResponse = self
            .send_json(routes::UPDATE_PROFILE, self.http.post(url).json(request))
            .await?;
        Ok(body.into_user())
    }

    async fn add_profile_image(&self, upload: AvatarUpload) -> Result<String, RemoteFailure> {
        let url = self.endpoint(routes::ADD_PROFILE_IMAGE)?;
        let part = multipart::Part::bytes(upload.bytes).file_name(upload.filename);
        let part = match upload.mime_type.as_deref() {
            Some(mime) => part.mime_str(mime).map_err(|err| {
                RemoteFailure::malformed(
                    routes::ADD_PROFILE_IMAGE,
                    format!("invalid mime type {mime}: {err}"),
                )
            })?,
            None => part,
        };
        let form = multipart::Form::new().part(PROFILE_IMAGE_FIELD, part);

        let body: ProfileImageResponse = self
            .send_json(routes::ADD_PROFILE_IMAGE, self.http.post(url).multipart(form))
            .await?;
        body.image.filter(|image| !image.is_empty()).ok_or_else(|| {
            RemoteFailure::malformed(routes::ADD_PROFILE_IMAGE, "response carries no image")
        })
    }

    async fn remove_profile_image(&self) -> Result<(), RemoteFailure> {
        let url = self.endpoint(routes::REMOVE_PROFILE_IMAGE)?;
        self.send(routes::REMOVE_PROFILE_IMAGE, self.http.delete(url))
            .await?;
        Ok(())
    }

    async fn contacts_with_messages(&self) -> Result<Vec<Contact>, RemoteFailure> {
        let body: ContactsResponse = self.get(routes::CONTACTS_WITH_MESSAGES).await?;
        body.contacts.ok_or_else(|| {
            RemoteFailure::malformed(routes::CONTACTS_WITH_MESSAGES, "response carries no contacts")
        })
    }

    async fn user_channels(&self) -> Result<Vec<Channel>, RemoteFailure> {
        let body: ChannelsResponse = self.get(routes::USER_CHANNELS).await?;
        body.channels.ok_or_else(|| {
            RemoteFailure::malformed(routes::USER_CHANNELS, "response carries no channels")
        })
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
