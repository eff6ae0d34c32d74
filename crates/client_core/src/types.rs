use shared::{
    domain::{ChannelId, ChatKind, UserId},
    protocol::UserIdentity,
};

/// Reference to an open conversation. The absence of a selection is
/// expressed as `Option<ChatRef>::None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChatRef {
    Contact(UserId),
    Channel(ChannelId),
}

impl ChatRef {
    pub fn new(kind: ChatKind, id: impl Into<String>) -> Self {
        match kind {
            ChatKind::Contact => ChatRef::Contact(UserId(id.into())),
            ChatKind::Channel => ChatRef::Channel(ChannelId(id.into())),
        }
    }

    pub fn kind(&self) -> ChatKind {
        match self {
            ChatRef::Contact(_) => ChatKind::Contact,
            ChatRef::Channel(_) => ChatKind::Channel,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ChatRef::Contact(id) => id.as_str(),
            ChatRef::Channel(id) => id.as_str(),
        }
    }
}

/// Published after every store mutation has been fully applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    SessionChanged(Option<UserIdentity>),
    ContactsReplaced { count: usize, generation: u64 },
    ChannelsReplaced { count: usize, generation: u64 },
    SelectionChanged(Option<ChatRef>),
    LoadingChanged(bool),
}

#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}
