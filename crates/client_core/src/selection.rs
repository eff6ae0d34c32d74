use shared::domain::ChatKind;

use crate::{
    collections::CollectionCache,
    error::{ClientError, ClientResult},
    types::ChatRef,
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    current: Option<ChatRef>,
    panel_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderAvatar {
    Image(String),
    Initial {
        letter: char,
        color_index: Option<u32>,
    },
    ChannelGlyph,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatHeader {
    pub kind: ChatKind,
    pub title: String,
    pub avatar: HeaderAvatar,
}

impl Selection {
    pub fn current(&self) -> Option<&ChatRef> {
        self.current.as_ref()
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    /// Opens `target`. Fails without touching the selection when the
    /// referenced entity is not in the cache.
    pub fn select(&mut self, target: ChatRef, cache: &CollectionCache) -> ClientResult<()> {
        if !cache.contains(&target) {
            return Err(ClientError::NotFound {
                kind: target.kind(),
                id: target.id().to_string(),
            });
        }
        self.current = Some(target);
        self.panel_open = true;
        Ok(())
    }

    pub fn close(&mut self) -> bool {
        let changed = self.current.is_some() || self.panel_open;
        self.current = None;
        self.panel_open = false;
        changed
    }

    /// Drops a selection whose target disappeared from the cache. Returns
    /// whether the selection was cleared.
    pub fn repair(&mut self, cache: &CollectionCache) -> bool {
        match &self.current {
            Some(target) if !cache.contains(target) => self.close(),
            _ => false,
        }
    }

    pub fn header(&self, cache: &CollectionCache) -> Option<ChatHeader> {
        match self.current.as_ref()? {
            ChatRef::Contact(id) => {
                let contact = cache.contact(id)?;
                let avatar = match &contact.avatar_ref {
                    Some(image) if !image.is_empty() => HeaderAvatar::Image(image.clone()),
                    _ => HeaderAvatar::Initial {
                        letter: contact.initial().unwrap_or('?'),
                        color_index: contact.color_index,
                    },
                };
                Some(ChatHeader {
                    kind: ChatKind::Contact,
                    title: contact.display_name(),
                    avatar,
                })
            }
            ChatRef::Channel(id) => {
                let channel = cache.channel(id)?;
                Some(ChatHeader {
                    kind: ChatKind::Channel,
                    title: channel.name.clone(),
                    avatar: HeaderAvatar::ChannelGlyph,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use shared::{
        domain::{ChannelId, UserId},
        protocol::{Channel, Contact},
    };

    use super::*;

    fn cache() -> CollectionCache {
        let mut cache = CollectionCache::default();
        let mut ada = Contact::new("u1", "ada@x.com");
        ada.first_name = Some("Ada".into());
        ada.last_name = Some("Lovelace".into());
        ada.color_index = Some(1);
        cache.set_contacts(vec![ada, Contact::new("u2", "bob@x.com")]);
        cache.set_channels(vec![Channel::new("c1", "general")]);
        cache
    }

    #[test]
    fn select_present_contact_opens_panel() {
        let cache = cache();
        let mut selection = Selection::default();
        selection
            .select(ChatRef::Contact(UserId::new("u1")), &cache)
            .expect("select");

        assert_eq!(
            selection.current(),
            Some(&ChatRef::Contact(UserId::new("u1")))
        );
        assert!(selection.is_panel_open());
    }

    #[test]
    fn select_absent_id_is_not_found_and_leaves_selection() {
        let cache = cache();
        let mut selection = Selection::default();
        selection
            .select(ChatRef::Channel(ChannelId::new("c1")), &cache)
            .expect("select");

        let err = selection
            .select(ChatRef::Contact(UserId::new("ghost")), &cache)
            .expect_err("absent contact");
        assert_eq!(
            err,
            ClientError::NotFound {
                kind: ChatKind::Contact,
                id: "ghost".into()
            }
        );
        assert_eq!(
            selection.current(),
            Some(&ChatRef::Channel(ChannelId::new("c1")))
        );
    }

    #[test]
    fn kinds_do_not_cross_collections() {
        let cache = cache();
        let mut selection = Selection::default();
        assert!(selection
            .select(ChatRef::Channel(ChannelId::new("u1")), &cache)
            .is_err());
    }

    #[test]
    fn close_is_idempotent() {
        let cache = cache();
        let mut selection = Selection::default();
        selection
            .select(ChatRef::Contact(UserId::new("u2")), &cache)
            .expect("select");

        assert!(selection.close());
        assert!(!selection.close());
        assert_eq!(selection.current(), None);
        assert!(!selection.is_panel_open());
    }

    #[test]
    fn headers_follow_the_selected_entity() {
        let cache = cache();
        let mut selection = Selection::default();
        assert_eq!(selection.header(&cache), None);

        selection
            .select(ChatRef::Contact(UserId::new("u1")), &cache)
            .expect("select");
        assert_eq!(
            selection.header(&cache),
            Some(ChatHeader {
                kind: ChatKind::Contact,
                title: "Ada Lovelace".into(),
                avatar: HeaderAvatar::Initial {
                    letter: 'A',
                    color_index: Some(1)
                },
            })
        );

        selection
            .select(ChatRef::Channel(ChannelId::new("c1")), &cache)
            .expect("select");
        let header = selection.header(&cache).expect("header");
        assert_eq!(header.title, "general");
        assert_eq!(header.avatar, HeaderAvatar::ChannelGlyph);
    }
}
