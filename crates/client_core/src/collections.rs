use shared::{
    domain::{ChannelId, UserId},
    protocol::{Channel, Contact},
};

use crate::types::ChatRef;

/// Snapshot cache of the direct-message contacts and the channels.
///
/// Each collection is replaced as a whole; order is kept exactly as the
/// server sent it. Writers outside the crate go through [`crate::Store`], which
/// runs selection repair after every replace.
#[derive(Debug, Default)]
pub struct CollectionCache {
    contacts: Vec<Contact>,
    channels: Vec<Channel>,
    contacts_generation: u64,
    channels_generation: u64,
}

impl CollectionCache {
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn contact(&self, id: &UserId) -> Option<&Contact> {
        self.contacts.iter().find(|contact| &contact.id == id)
    }

    pub fn channel(&self, id: &ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|channel| &channel.id == id)
    }

    pub fn contains(&self, target: &ChatRef) -> bool {
        match target {
            ChatRef::Contact(id) => self.contact(id).is_some(),
            ChatRef::Channel(id) => self.channel(id).is_some(),
        }
    }

    pub fn contacts_generation(&self) -> u64 {
        self.contacts_generation
    }

    pub fn channels_generation(&self) -> u64 {
        self.channels_generation
    }

    pub(crate) fn set_contacts(&mut self, items: Vec<Contact>) -> u64 {
        self.contacts = items;
        self.contacts_generation += 1;
        self.contacts_generation
    }

    pub(crate) fn set_channels(&mut self, items: Vec<Channel>) -> u64 {
        self.channels = items;
        self.channels_generation += 1;
        self.channels_generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_contacts_keeps_order_and_duplicates_verbatim() {
        let mut cache = CollectionCache::default();
        let snapshot = vec![
            Contact::new("u3", "c@x.com"),
            Contact::new("u1", "a@x.com"),
            Contact::new("u2", "b@x.com"),
        ];

        cache.set_contacts(snapshot.clone());
        assert_eq!(cache.contacts(), snapshot.as_slice());
        assert_eq!(cache.contacts_generation(), 1);
    }

    #[test]
    fn replace_supersedes_previous_snapshot() {
        let mut cache = CollectionCache::default();
        cache.set_channels(vec![Channel::new("c1", "general"), Channel::new("c2", "random")]);
        cache.set_channels(vec![Channel::new("c3", "ops")]);

        assert_eq!(cache.channels().len(), 1);
        assert!(cache.channel(&ChannelId::new("c1")).is_none());
        assert!(cache.contains(&ChatRef::Channel(ChannelId::new("c3"))));
        assert_eq!(cache.channels_generation(), 2);
    }
}
