use shared::protocol::UserIdentity;

/// Holds the authenticated user's identity record.
///
/// The record is only ever replaced wholesale. `epoch` identifies one
/// authenticated session: it advances whenever a new session starts or the
/// current one is cleared, and in-flight requests compare it on completion to
/// detect that the session they were issued for is gone.
#[derive(Debug, Default)]
pub struct SessionStore {
    identity: Option<UserIdentity>,
    epoch: u64,
}

impl SessionStore {
    pub fn get(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn replace(&mut self, identity: UserIdentity) {
        self.identity = Some(identity);
    }

    pub fn begin(&mut self, identity: UserIdentity) -> u64 {
        self.epoch += 1;
        self.identity = Some(identity);
        self.epoch
    }

    pub fn clear(&mut self) {
        self.epoch += 1;
        self.identity = None;
    }
}
