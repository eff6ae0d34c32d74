use std::sync::Arc;

use shared::domain::ChatKind;
use tracing::{debug, info, warn};

use crate::{
    boundary::{Notice, Notifier},
    error::RemoteFailure,
    store::Store,
    transport::ChatApi,
};

/// Outcome of one collection retrieval within a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { count: usize },
    /// The session changed while the request was in flight; result dropped.
    Discarded,
    Failed(RemoteFailure),
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub contacts: FetchOutcome,
    pub channels: FetchOutcome,
}

/// Populates the collection cache on workspace entry.
#[derive(Clone)]
pub struct FetchOrchestrator {
    store: Store,
    api: Arc<dyn ChatApi>,
    notifier: Arc<dyn Notifier>,
}

impl FetchOrchestrator {
    pub fn new(store: Store, api: Arc<dyn ChatApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            api,
            notifier,
        }
    }

    /// Fetches contacts and channels concurrently, writing each result the
    /// moment it arrives. `None` when the session may not see the workspace.
    pub async fn refresh(&self) -> Option<RefreshReport> {
        let Some(epoch) = self.store.begin_refresh().await else {
            debug!("refresh skipped: workspace not open to this session");
            return None;
        };
        debug!(epoch, "refreshing contacts and channels");

        let (contacts, channels) = futures::join!(
            self.fetch_contacts(epoch),
            self.fetch_channels(epoch)
        );

        self.store.end_refresh(epoch).await;
        Some(RefreshReport { contacts, channels })
    }

    async fn fetch_contacts(&self, epoch: u64) -> FetchOutcome {
        match self.api.contacts_with_messages().await {
            Ok(items) => {
                let count = items.len();
                if self.store.set_contacts_in(epoch, items).await {
                    info!(count, "contacts snapshot applied");
                    FetchOutcome::Applied { count }
                } else {
                    debug!(epoch, "dropping contacts for a superseded session");
                    FetchOutcome::Discarded
                }
            }
            Err(failure) => self.report(ChatKind::Contact, epoch, failure).await,
        }
    }

    async fn fetch_channels(&self, epoch: u64) -> FetchOutcome {
        match self.api.user_channels().await {
            Ok(items) => {
                let count = items.len();
                if self.store.set_channels_in(epoch, items).await {
                    info!(count, "channels snapshot applied");
                    FetchOutcome::Applied { count }
                } else {
                    debug!(epoch, "dropping channels for a superseded session");
                    FetchOutcome::Discarded
                }
            }
            Err(failure) => self.report(ChatKind::Channel, epoch, failure).await,
        }
    }

    async fn report(&self, kind: ChatKind, epoch: u64, failure: RemoteFailure) -> FetchOutcome {
        if self.store.session_epoch().await != epoch {
            return FetchOutcome::Discarded;
        }
        warn!(%kind, "collection fetch failed, keeping previous snapshot: {failure}");
        self.notifier.notify(&Notice::FetchFailed(kind));
        FetchOutcome::Failed(failure)
    }
}
