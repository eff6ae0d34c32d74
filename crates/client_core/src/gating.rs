//! Which screen a session may see.
//!
//! The gate state is a pure function of the session record and is
//! recomputed on every check; nothing here is cached, so a replaced identity
//! changes the outcome of the very next navigation.

use std::sync::Arc;

use shared::protocol::UserIdentity;
use tracing::debug;

use crate::{
    boundary::{Navigator, Notice, Notifier, Screen},
    store::Store,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unauthenticated,
    ProfileIncomplete,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Granted(Screen),
    Redirected { requested: Screen, to: Screen },
}

impl Authorization {
    pub fn destination(&self) -> Screen {
        match self {
            Authorization::Granted(screen) => *screen,
            Authorization::Redirected { to, .. } => *to,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Authorization::Granted(_))
    }
}

pub fn resolve(identity: Option<&UserIdentity>) -> GateState {
    match identity {
        None => GateState::Unauthenticated,
        Some(user) if !user.profile_setup_complete => GateState::ProfileIncomplete,
        Some(_) => GateState::Ready,
    }
}

impl GateState {
    /// Where this session lands when it asks for nothing in particular.
    pub fn home(self) -> Screen {
        match self {
            GateState::Unauthenticated => Screen::Auth,
            GateState::ProfileIncomplete => Screen::Profile,
            GateState::Ready => Screen::Chat,
        }
    }

    pub fn authorize(self, requested: Screen) -> Authorization {
        let allowed = match (self, requested) {
            (GateState::Unauthenticated, Screen::Auth) => true,
            (GateState::Unauthenticated, _) => false,
            // Signed-in users never see the auth screen again.
            (_, Screen::Auth) => false,
            (GateState::ProfileIncomplete, Screen::Profile) => true,
            (GateState::ProfileIncomplete, Screen::Chat) => false,
            (GateState::Ready, _) => true,
        };
        if allowed {
            Authorization::Granted(requested)
        } else {
            Authorization::Redirected {
                requested,
                to: self.home(),
            }
        }
    }
}

#[derive(Clone)]
pub struct Gate {
    store: Store,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
}

impl Gate {
    pub fn new(store: Store, navigator: Arc<dyn Navigator>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            navigator,
            notifier,
        }
    }

    pub async fn state(&self) -> GateState {
        self.store.gate().await
    }

    /// Authorizes `requested` against the current session and moves to the
    /// granted or forced destination.
    pub async fn navigate(&self, requested: Screen) -> Authorization {
        let state = self.state().await;
        let decision = state.authorize(requested);
        if let Authorization::Redirected { requested, to } = decision {
            debug!(?state, ?requested, ?to, "navigation redirected");
            if state == GateState::ProfileIncomplete && requested == Screen::Chat {
                self.notifier.notify(&Notice::ProfileSetupRequired);
            }
        }
        self.navigator.go_to(decision.destination());
        decision
    }

    pub async fn enter(&self) -> Screen {
        let screen = self.state().await.home();
        self.navigator.go_to(screen);
        screen
    }

    /// Back action on the profile editor: only a completed profile may leave
    /// for the chat workspace.
    pub async fn leave_profile(&self) -> Authorization {
        match self.state().await {
            GateState::Ready => {
                self.navigator.go_to(Screen::Chat);
                Authorization::Granted(Screen::Chat)
            }
            GateState::ProfileIncomplete => {
                self.notifier.notify(&Notice::ProfileSetupRequired);
                Authorization::Redirected {
                    requested: Screen::Chat,
                    to: Screen::Profile,
                }
            }
            GateState::Unauthenticated => {
                self.navigator.go_to(Screen::Auth);
                Authorization::Redirected {
                    requested: Screen::Chat,
                    to: Screen::Auth,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(complete: bool) -> UserIdentity {
        let mut user = UserIdentity::new("u1", "a@x.com");
        user.profile_setup_complete = complete;
        user
    }

    #[test]
    fn resolves_from_identity() {
        assert_eq!(resolve(None), GateState::Unauthenticated);
        assert_eq!(resolve(Some(&user(false))), GateState::ProfileIncomplete);
        assert_eq!(resolve(Some(&user(true))), GateState::Ready);
    }

    #[test]
    fn chat_is_granted_only_when_ready() {
        assert_eq!(
            GateState::Ready.authorize(Screen::Chat),
            Authorization::Granted(Screen::Chat)
        );
        assert_eq!(
            GateState::ProfileIncomplete.authorize(Screen::Chat),
            Authorization::Redirected {
                requested: Screen::Chat,
                to: Screen::Profile
            }
        );
        assert_eq!(
            GateState::Unauthenticated
                .authorize(Screen::Chat)
                .destination(),
            Screen::Auth
        );
    }

    #[test]
    fn full_screen_table() {
        use GateState::*;
        use Screen::*;

        let cases = [
            (Unauthenticated, Auth, Auth),
            (Unauthenticated, Profile, Auth),
            (ProfileIncomplete, Auth, Profile),
            (ProfileIncomplete, Profile, Profile),
            (Ready, Auth, Chat),
            (Ready, Profile, Profile),
            (Ready, Chat, Chat),
        ];
        for (state, requested, expected) in cases {
            assert_eq!(
                state.authorize(requested).destination(),
                expected,
                "{state:?} requesting {requested:?}"
            );
        }
    }
}
