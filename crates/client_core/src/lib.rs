use std::sync::Arc;

use anyhow::Result;
use shared::{domain::ChatKind, protocol::UserIdentity};
use tokio::sync::broadcast;
use tracing::debug;

pub mod auth;
pub mod boundary;
pub mod collections;
pub mod error;
pub mod fetch;
pub mod gating;
pub mod profile;
pub mod selection;
pub mod session;
pub mod settings;
pub mod store;
pub mod transport;
pub mod types;

pub use auth::{password_strength, AuthFlow, PasswordStrength, StrengthLabel};
pub use boundary::{
    Confirmer, FixedConfirmer, LogNavigator, LogNotifier, Navigator, Notice, NoticeLevel,
    Notifier, Screen,
};
pub use error::{ClientError, ClientResult, RemoteFailure, RemoteFailureKind, ValidationError};
pub use fetch::{FetchOrchestrator, FetchOutcome, RefreshReport};
pub use gating::{Authorization, Gate, GateState};
pub use profile::{ProfileDraft, ProfilePipeline};
pub use selection::{ChatHeader, HeaderAvatar};
pub use settings::{load_settings, ClientSettings};
pub use store::Store;
pub use transport::{ChatApi, HttpChatApi, MissingChatApi};
pub use types::{AvatarUpload, ChatRef, StoreEvent};

#[derive(Clone)]
pub struct Collaborators {
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
    pub confirmer: Arc<dyn Confirmer>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            navigator: Arc::new(LogNavigator),
            notifier: Arc::new(LogNotifier),
            confirmer: Arc::new(FixedConfirmer(false)),
        }
    }
}

/// One authenticated client: the shared store plus every component that
/// reads or writes it.
pub struct ChatClient {
    store: Store,
    gate: Gate,
    auth: AuthFlow,
    fetch: FetchOrchestrator,
    profile: ProfilePipeline,
}

impl ChatClient {
    pub fn new(api: Arc<dyn ChatApi>, collaborators: Collaborators, event_capacity: usize) -> Self {
        let Collaborators {
            navigator,
            notifier,
            confirmer,
        } = collaborators;
        let store = Store::new(event_capacity);
        let gate = Gate::new(store.clone(), navigator, Arc::clone(&notifier));
        let auth = AuthFlow::new(
            store.clone(),
            Arc::clone(&api),
            gate.clone(),
            Arc::clone(&notifier),
        );
        let fetch = FetchOrchestrator::new(store.clone(), Arc::clone(&api), Arc::clone(&notifier));
        let profile = ProfilePipeline::new(store.clone(), api, gate.clone(), notifier, confirmer);
        Self {
            store,
            gate,
            auth,
            fetch,
            profile,
        }
    }

    pub fn connect(settings: &ClientSettings, collaborators: Collaborators) -> Result<Self> {
        let api = HttpChatApi::new(settings)?;
        debug!(server = %api.base_url(), "chat client configured");
        Ok(Self::new(
            Arc::new(api),
            collaborators,
            settings.event_capacity,
        ))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    pub async fn session(&self) -> Option<UserIdentity> {
        self.store.session().await
    }

    pub async fn gate_state(&self) -> GateState {
        self.gate.state().await
    }

    pub async fn navigate(&self, screen: Screen) -> Authorization {
        self.gate.navigate(screen).await
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<GateState> {
        self.auth.login(email, password).await
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> ClientResult<GateState> {
        self.auth.signup(email, password, confirm_password).await
    }

    pub async fn restore_session(&self) -> GateState {
        self.auth.restore_session().await
    }

    pub async fn logout(&self) {
        self.auth.logout().await
    }

    /// Asks to enter the chat workspace; once granted, loads both collections.
    pub async fn enter_workspace(&self) -> (Authorization, Option<RefreshReport>) {
        let decision = self.gate.navigate(Screen::Chat).await;
        if !decision.is_granted() {
            return (decision, None);
        }
        (decision, self.fetch.refresh().await)
    }

    pub async fn refresh(&self) -> Option<RefreshReport> {
        self.fetch.refresh().await
    }

    pub async fn select_chat(&self, kind: ChatKind, id: &str) -> ClientResult<()> {
        self.store.select(kind, id).await
    }

    pub async fn close_chat(&self) {
        self.store.close_chat().await
    }

    pub async fn chat_header(&self) -> Option<ChatHeader> {
        self.store.chat_header().await
    }

    pub async fn profile_draft(&self) -> Option<ProfileDraft> {
        self.store
            .session()
            .await
            .map(|user| ProfileDraft::from_identity(&user))
    }

    pub async fn update_profile(
        &self,
        first_name: &str,
        last_name: &str,
        color_index: u32,
    ) -> ClientResult<UserIdentity> {
        self.profile
            .update_profile(first_name, last_name, color_index)
            .await
    }

    pub async fn set_avatar(&self, upload: AvatarUpload) -> ClientResult<String> {
        self.profile.set_avatar(upload).await
    }

    pub async fn clear_avatar(&self) -> ClientResult<bool> {
        self.profile.clear_avatar().await
    }

    pub async fn leave_profile(&self) -> Authorization {
        self.gate.leave_profile().await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
