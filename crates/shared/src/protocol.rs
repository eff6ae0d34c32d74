use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{ChannelId, UserId};

/// The authenticated user's identity record as the server returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    #[serde(alias = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, rename = "color", skip_serializing_if = "Option::is_none")]
    pub color_index: Option<u32>,
    #[serde(default, rename = "image", skip_serializing_if = "Option::is_none")]
    pub avatar_ref: Option<String>,
    #[serde(default, rename = "profileSetup", alias = "profileSetupComplete")]
    pub profile_setup_complete: bool,
}

impl UserIdentity {
    pub fn new(id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            first_name: None,
            last_name: None,
            color_index: None,
            avatar_ref: None,
            profile_setup_complete: false,
        }
    }

    /// Returns a copy with only the avatar reference replaced.
    pub fn with_avatar(&self, avatar_ref: Option<String>) -> Self {
        Self {
            avatar_ref,
            ..self.clone()
        }
    }
}

/// A direct-message peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(alias = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, rename = "color", skip_serializing_if = "Option::is_none")]
    pub color_index: Option<u32>,
    #[serde(default, rename = "image", skip_serializing_if = "Option::is_none")]
    pub avatar_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_time: Option<DateTime<Utc>>,
}

impl Contact {
    pub fn new(id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            first_name: None,
            last_name: None,
            color_index: None,
            avatar_ref: None,
            last_message_time: None,
        }
    }

    /// "First Last" when both names are set, otherwise the email address.
    pub fn display_name(&self) -> String {
        match (non_empty(&self.first_name), non_empty(&self.last_name)) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            _ => self.email.clone(),
        }
    }

    /// First character of the first name, falling back to the email.
    pub fn initial(&self) -> Option<char> {
        non_empty(&self.first_name)
            .unwrap_or(self.email.as_str())
            .chars()
            .next()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(alias = "_id")]
    pub id: ChannelId,
    pub name: String,
    #[serde(
        default,
        rename = "members",
        alias = "memberIds",
        deserialize_with = "member_ids"
    )]
    pub member_ids: BTreeSet<UserId>,
    #[serde(
        default,
        rename = "admin",
        deserialize_with = "optional_member_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub admin_id: Option<UserId>,
}

impl Channel {
    pub fn new(id: impl Into<ChannelId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            member_ids: BTreeSet::new(),
            admin_id: None,
        }
    }
}

/// Channel members come back either as bare ids or as populated user objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum MemberRef {
    Id(UserId),
    Object {
        #[serde(alias = "_id")]
        id: UserId,
    },
}

impl From<MemberRef> for UserId {
    fn from(value: MemberRef) -> Self {
        match value {
            MemberRef::Id(id) | MemberRef::Object { id } => id,
        }
    }
}

fn member_ids<'de, D>(deserializer: D) -> Result<BTreeSet<UserId>, D::Error>
where
    D: Deserializer<'de>,
{
    let members = Vec::<MemberRef>::deserialize(deserializer)?;
    Ok(members.into_iter().map(UserId::from).collect())
}

fn optional_member_id<'de, D>(deserializer: D) -> Result<Option<UserId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<MemberRef>::deserialize(deserializer)?.map(UserId::from))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub color: u32,
}

/// `{ "user": { ... } }` as returned by login, signup and user-info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: UserIdentity,
}

/// update-profile answers with the record either wrapped or bare.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UpdateProfileResponse {
    Wrapped { user: UserIdentity },
    Bare(UserIdentity),
}

impl UpdateProfileResponse {
    pub fn into_user(self) -> UserIdentity {
        match self {
            Self::Wrapped { user } | Self::Bare(user) => user,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileImageResponse {
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactsResponse {
    #[serde(default)]
    pub contacts: Option<Vec<Contact>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsResponse {
    #[serde(default)]
    pub channels: Option<Vec<Channel>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_login_user() {
        let envelope: UserEnvelope =
            serde_json::from_str(r#"{"user":{"id":1,"profileSetupComplete":false}}"#)
                .expect("decode");
        assert_eq!(envelope.user.id, UserId::from(1));
        assert!(!envelope.user.profile_setup_complete);
        assert_eq!(envelope.user.avatar_ref, None);
    }

    #[test]
    fn decodes_server_shaped_user_record() {
        let user: UserIdentity = serde_json::from_str(
            r#"{"_id":"u1","email":"a@x.com","firstName":"Ada","lastName":"Lovelace","color":2,"image":"uploads/profiles/a.png","profileSetup":true,"__v":0}"#,
        )
        .expect("decode");
        assert_eq!(user.id, UserId::new("u1"));
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(user.color_index, Some(2));
        assert_eq!(user.avatar_ref.as_deref(), Some("uploads/profiles/a.png"));
        assert!(user.profile_setup_complete);
    }

    #[test]
    fn channel_members_accept_ids_and_populated_objects() {
        let channel: Channel = serde_json::from_str(
            r#"{"_id":"c1","name":"general","members":["u1",{"_id":"u2","email":"b@x.com"}],"admin":{"_id":"u1"}}"#,
        )
        .expect("decode");
        assert_eq!(channel.member_ids.len(), 2);
        assert!(channel.member_ids.contains(&UserId::new("u2")));
        assert_eq!(channel.admin_id, Some(UserId::new("u1")));
    }

    #[test]
    fn contact_display_name_falls_back_to_email() {
        let mut contact = Contact::new("u1", "ada@x.com");
        assert_eq!(contact.display_name(), "ada@x.com");
        assert_eq!(contact.initial(), Some('a'));

        contact.first_name = Some("Ada".into());
        assert_eq!(contact.display_name(), "ada@x.com");
        assert_eq!(contact.initial(), Some('A'));

        contact.last_name = Some("Lovelace".into());
        assert_eq!(contact.display_name(), "Ada Lovelace");
    }

    #[test]
    fn update_profile_response_accepts_both_shapes() {
        let bare: UpdateProfileResponse =
            serde_json::from_str(r#"{"id":"u1","email":"a@x.com","profileSetup":true}"#)
                .expect("bare");
        let wrapped: UpdateProfileResponse =
            serde_json::from_str(r#"{"user":{"id":"u1","email":"a@x.com","profileSetup":true}}"#)
                .expect("wrapped");
        assert_eq!(bare.into_user(), wrapped.into_user());
    }
}
