use std::sync::Arc;

use shared::{
    domain::ChatKind,
    protocol::{Channel, Contact, UserIdentity},
};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::{
    collections::CollectionCache,
    error::ClientResult,
    gating::{self, GateState},
    selection::{ChatHeader, Selection},
    session::SessionStore,
    types::{ChatRef, StoreEvent},
};

/// Everything the client knows about the current session, guarded as one
/// unit so that each mutation is observed either entirely or not at all.
#[derive(Debug, Default)]
pub struct StoreState {
    pub(crate) session: SessionStore,
    pub(crate) collections: CollectionCache,
    pub(crate) selection: Selection,
    inflight_refreshes: usize,
}

impl StoreState {
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn collections(&self) -> &CollectionCache {
        &self.collections
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_loading(&self) -> bool {
        self.inflight_refreshes > 0
    }

    pub fn gate(&self) -> GateState {
        gating::resolve(self.session.get())
    }

    fn begin_session(&mut self, identity: UserIdentity, events: &mut Vec<StoreEvent>) -> u64 {
        let epoch = self.session.begin(identity);
        events.push(StoreEvent::SessionChanged(self.session.get().cloned()));
        // Nothing loaded for the previous session carries over.
        self.reset_workspace(events);
        epoch
    }

    fn replace_session(&mut self, identity: UserIdentity, events: &mut Vec<StoreEvent>) {
        self.session.replace(identity);
        events.push(StoreEvent::SessionChanged(self.session.get().cloned()));
    }

    fn set_contacts(&mut self, items: Vec<Contact>, events: &mut Vec<StoreEvent>) {
        let count = items.len();
        let generation = self.collections.set_contacts(items);
        events.push(StoreEvent::ContactsReplaced { count, generation });
        self.repair_selection(events);
    }

    fn set_channels(&mut self, items: Vec<Channel>, events: &mut Vec<StoreEvent>) {
        let count = items.len();
        let generation = self.collections.set_channels(items);
        events.push(StoreEvent::ChannelsReplaced { count, generation });
        self.repair_selection(events);
    }

    fn repair_selection(&mut self, events: &mut Vec<StoreEvent>) {
        if self.selection.repair(&self.collections) {
            debug!("selected chat vanished from refreshed snapshot; closing");
            events.push(StoreEvent::SelectionChanged(None));
        }
    }

    fn clear(&mut self, events: &mut Vec<StoreEvent>) {
        self.session.clear();
        events.push(StoreEvent::SessionChanged(None));
        self.reset_workspace(events);
    }

    fn reset_workspace(&mut self, events: &mut Vec<StoreEvent>) {
        let generation = self.collections.set_contacts(Vec::new());
        events.push(StoreEvent::ContactsReplaced {
            count: 0,
            generation,
        });
        let generation = self.collections.set_channels(Vec::new());
        events.push(StoreEvent::ChannelsReplaced {
            count: 0,
            generation,
        });
        if self.selection.close() {
            events.push(StoreEvent::SelectionChanged(None));
        }
        if self.is_loading() {
            self.inflight_refreshes = 0;
            events.push(StoreEvent::LoadingChanged(false));
        }
    }
}

/// Shared handle to the client state. Cheap to clone; every clone sees the
/// same state and publishes on the same event channel.
#[derive(Clone)]
pub struct Store {
    state: Arc<Mutex<StoreState>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Store {
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Runs `f` against the state inside one critical section and publishes
    /// whatever events it produced once the lock is released.
    async fn mutate<T>(&self, f: impl FnOnce(&mut StoreState, &mut Vec<StoreEvent>) -> T) -> T {
        let mut events = Vec::new();
        let out = {
            let mut guard = self.state.lock().await;
            f(&mut *guard, &mut events)
        };
        for event in events {
            let _ = self.events.send(event);
        }
        out
    }

    pub async fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> T {
        let guard = self.state.lock().await;
        f(&*guard)
    }

    pub async fn session(&self) -> Option<UserIdentity> {
        self.read(|state| state.session.get().cloned()).await
    }

    pub async fn session_epoch(&self) -> u64 {
        self.read(|state| state.session.epoch()).await
    }

    pub async fn gate(&self) -> GateState {
        self.read(StoreState::gate).await
    }

    pub async fn contacts(&self) -> Vec<Contact> {
        self.read(|state| state.collections.contacts().to_vec()).await
    }

    pub async fn channels(&self) -> Vec<Channel> {
        self.read(|state| state.collections.channels().to_vec()).await
    }

    pub async fn selected_chat(&self) -> Option<ChatRef> {
        self.read(|state| state.selection.current().cloned()).await
    }

    pub async fn is_chat_open(&self) -> bool {
        self.read(|state| state.selection.is_panel_open()).await
    }

    pub async fn chat_header(&self) -> Option<ChatHeader> {
        self.read(|state| state.selection.header(&state.collections))
            .await
    }

    pub async fn is_loading(&self) -> bool {
        self.read(StoreState::is_loading).await
    }

    pub async fn begin_session(&self, identity: UserIdentity) -> u64 {
        self.mutate(|state, events| state.begin_session(identity, events))
            .await
    }

    /// Starts a session only if no other session began or ended since
    /// `epoch` was read.
    pub async fn begin_session_in(&self, epoch: u64, identity: UserIdentity) -> bool {
        self.mutate(|state, events| {
            if state.session.epoch() != epoch {
                return false;
            }
            state.begin_session(identity, events);
            true
        })
        .await
    }

    pub async fn replace_session(&self, identity: UserIdentity) {
        self.mutate(|state, events| state.replace_session(identity, events))
            .await
    }

    pub async fn replace_session_in(&self, epoch: u64, identity: UserIdentity) -> bool {
        self.mutate(|state, events| {
            if state.session.epoch() != epoch || !state.session.is_authenticated() {
                return false;
            }
            state.replace_session(identity, events);
            true
        })
        .await
    }

    pub async fn update_session_in(
        &self,
        epoch: u64,
        f: impl FnOnce(&UserIdentity) -> UserIdentity,
    ) -> bool {
        self.mutate(|state, events| {
            if state.session.epoch() != epoch {
                return false;
            }
            let Some(updated) = state.session.get().map(f) else {
                return false;
            };
            state.replace_session(updated, events);
            true
        })
        .await
    }

    pub async fn set_contacts(&self, items: Vec<Contact>) {
        self.mutate(|state, events| state.set_contacts(items, events))
            .await
    }

    pub async fn set_channels(&self, items: Vec<Channel>) {
        self.mutate(|state, events| state.set_channels(items, events))
            .await
    }

    pub(crate) async fn set_contacts_in(&self, epoch: u64, items: Vec<Contact>) -> bool {
        self.mutate(|state, events| {
            if state.session.epoch() != epoch {
                return false;
            }
            state.set_contacts(items, events);
            true
        })
        .await
    }

    pub(crate) async fn set_channels_in(&self, epoch: u64, items: Vec<Channel>) -> bool {
        self.mutate(|state, events| {
            if state.session.epoch() != epoch {
                return false;
            }
            state.set_channels(items, events);
            true
        })
        .await
    }

    pub async fn select(&self, kind: ChatKind, id: &str) -> ClientResult<()> {
        let target = ChatRef::new(kind, id);
        self.mutate(|state, events| -> ClientResult<()> {
            state
                .selection
                .select(target.clone(), &state.collections)?;
            events.push(StoreEvent::SelectionChanged(Some(target)));
            Ok(())
        })
        .await
    }

    pub async fn close_chat(&self) {
        self.mutate(|state, events| {
            if state.selection.close() {
                events.push(StoreEvent::SelectionChanged(None));
            }
        })
        .await
    }

    /// Registers an in-flight refresh for a session that may see the chat
    /// workspace and returns the epoch it belongs to.
    pub(crate) async fn begin_refresh(&self) -> Option<u64> {
        self.mutate(|state, events| {
            if state.gate() != GateState::Ready {
                return None;
            }
            state.inflight_refreshes += 1;
            if state.inflight_refreshes == 1 {
                events.push(StoreEvent::LoadingChanged(true));
            }
            Some(state.session.epoch())
        })
        .await
    }

    pub(crate) async fn end_refresh(&self, epoch: u64) {
        self.mutate(|state, events| {
            // A logout in between already reset the counter.
            if state.session.epoch() != epoch || state.inflight_refreshes == 0 {
                return;
            }
            state.inflight_refreshes -= 1;
            if state.inflight_refreshes == 0 {
                events.push(StoreEvent::LoadingChanged(false));
            }
        })
        .await
    }

    pub async fn clear(&self) {
        self.mutate(|state, events| state.clear(events)).await
    }
}
