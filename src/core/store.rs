use chrono::Utc;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    input::DEFAULT_MAX_PHOTO_BYTES,
    persist::{
        KeyValueStore, LoadedList, PersistResult, load_list, memory::MemoryKv, save_value,
    },
    record::{Contact, Encounter, NewContact, NewEncounter},
    stats::Stats,
    types::{ContactId, EncounterId},
};

use super::indices::{VecIndex, push_to_vec_index, remove_from_vec_index};

/// Rejected store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Encounter references a contact that does not exist.
    MissingContact(ContactId),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingContact(id) => write!(f, "no contact with id {id}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Storage keys and upload limits.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Key holding the contact collection.
    pub contacts_key: String,
    /// Key holding the encounter collection.
    pub encounters_key: String,
    /// Ceiling for uploaded photos, in bytes. Not read by the store; callers
    /// pass it to [`PhotoRef::from_upload`](crate::types::PhotoRef::from_upload).
    pub max_photo_bytes: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            contacts_key: "contacts".to_string(),
            encounters_key: "encounters".to_string(),
            max_photo_bytes: DEFAULT_MAX_PHOTO_BYTES,
        }
    }
}

/// Both collections, in insertion order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Contacts.
    pub contacts: Vec<Contact>,
    /// Encounters.
    pub encounters: Vec<Encounter>,
}

/// Outcome of [`RecordStore::delete_contact`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeletedContact {
    /// Removed contact, `None` when the id was unknown.
    pub contact: Option<Contact>,
    /// Encounters removed by the cascade, in their original order.
    pub encounters: Vec<Encounter>,
}

impl DeletedContact {
    /// True when nothing was removed.
    pub fn is_noop(&self) -> bool {
        self.contact.is_none() && self.encounters.is_empty()
    }
}

/// Owns the contact and encounter collections and mirrors them to a
/// [`KeyValueStore`] after every mutation.
pub struct RecordStore {
    contacts: Vec<Contact>,
    encounters: Vec<Encounter>,
    contact_pos: HashMap<ContactId, usize>,
    by_contact: VecIndex<ContactId, EncounterId>,
    kv: Box<dyn KeyValueStore>,
    config: StoreConfig,
    persist_failures: usize,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("contacts", &self.contacts.len())
            .field("encounters", &self.encounters.len())
            .field("config", &self.config)
            .field("persist_failures", &self.persist_failures)
            .finish()
    }
}

impl RecordStore {
    /// Empty store backed by a fresh [`MemoryKv`].
    pub fn in_memory() -> Self {
        Self::from_snapshot(
            StoreSnapshot::default(),
            Box::new(MemoryKv::new()),
            StoreConfig::default(),
        )
    }

    /// Seeds the store from `kv`, defaulting to empty collections.
    ///
    /// Undecodable records are logged and skipped; storage errors are
    /// returned. Load repairs are only written back when every stored record
    /// decoded, so a damaged blob is never replaced during `open`.
    pub fn open(kv: Box<dyn KeyValueStore>, config: StoreConfig) -> PersistResult<Self> {
        let contacts: LoadedList<Contact> = load_list(&*kv, &config.contacts_key)?;
        let encounters: LoadedList<Encounter> = load_list(&*kv, &config.encounters_key)?;

        let write_back = contacts.is_intact() && encounters.is_intact();
        if !write_back {
            warn!(
                contacts_skipped = contacts.skipped,
                encounters_skipped = encounters.skipped,
                "stored collections are damaged, leaving them untouched until the next mutation"
            );
        }

        let snapshot = StoreSnapshot {
            contacts: contacts.items,
            encounters: encounters.items,
        };
        let store = Self::build(snapshot, kv, config, write_back);
        info!(
            contacts = store.contacts.len(),
            encounters = store.encounters.len(),
            "record store opened"
        );
        Ok(store)
    }

    /// Builds a store over `snapshot`, dropping duplicate ids and orphan
    /// encounters. Repaired collections are written back to `kv`.
    pub fn from_snapshot(
        snapshot: StoreSnapshot,
        kv: Box<dyn KeyValueStore>,
        config: StoreConfig,
    ) -> Self {
        Self::build(snapshot, kv, config, true)
    }

    fn build(
        snapshot: StoreSnapshot,
        kv: Box<dyn KeyValueStore>,
        config: StoreConfig,
        write_back: bool,
    ) -> Self {
        let mut store = Self {
            contacts: Vec::with_capacity(snapshot.contacts.len()),
            encounters: Vec::with_capacity(snapshot.encounters.len()),
            contact_pos: HashMap::new(),
            by_contact: VecIndex::new(),
            kv,
            config,
            persist_failures: 0,
        };

        let mut dropped_contacts = 0usize;
        for contact in snapshot.contacts {
            if store.contact_pos.contains_key(&contact.id) {
                dropped_contacts += 1;
                continue;
            }
            store.contact_pos.insert(contact.id, store.contacts.len());
            store.contacts.push(contact);
        }

        let mut seen = HashSet::with_capacity(snapshot.encounters.len());
        let mut dropped_encounters = 0usize;
        for encounter in snapshot.encounters {
            let orphan = !store.contact_pos.contains_key(&encounter.contact_id);
            if orphan || !seen.insert(encounter.id) {
                dropped_encounters += 1;
                continue;
            }
            push_to_vec_index(&mut store.by_contact, encounter.contact_id, encounter.id);
            store.encounters.push(encounter);
        }

        if dropped_contacts > 0 {
            warn!(dropped = dropped_contacts, "dropped contacts with duplicate ids");
            if write_back {
                store.persist_contacts();
            }
        }
        if dropped_encounters > 0 {
            warn!(dropped = dropped_encounters, "dropped duplicate or orphan encounters");
            if write_back {
                store.persist_encounters();
            }
        }

        store
    }

    /// Clones both collections.
    pub fn export_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            contacts: self.contacts.clone(),
            encounters: self.encounters.clone(),
        }
    }

    /// Appends a contact with a fresh id and creation time.
    pub fn add_contact(&mut self, new: NewContact) -> Contact {
        let mut id = ContactId::generate();
        while self.contact_pos.contains_key(&id) {
            id = ContactId::generate();
        }

        let contact = new.into_contact(id, Utc::now());
        self.contact_pos.insert(id, self.contacts.len());
        self.contacts.push(contact.clone());
        debug!(%id, "contact added");

        self.persist_contacts();
        contact
    }

    /// Removes the contact and every encounter that references it.
    /// Unknown ids are a no-op.
    pub fn delete_contact(&mut self, id: ContactId) -> DeletedContact {
        let contact = self.contact_pos.remove(&id).map(|pos| {
            let removed = self.contacts.remove(pos);
            self.reindex_contacts_from(pos);
            removed
        });

        let mut encounters = Vec::new();
        if self.by_contact.remove(&id).is_some() {
            let (gone, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.encounters)
                .into_iter()
                .partition(|e| e.contact_id == id);
            self.encounters = kept;
            encounters = gone;
        }

        let deleted = DeletedContact { contact, encounters };
        if deleted.is_noop() {
            debug!(%id, "delete of unknown contact ignored");
            return deleted;
        }

        debug!(%id, encounters_removed = deleted.encounters.len(), "contact deleted");
        self.persist_contacts();
        if !deleted.encounters.is_empty() {
            self.persist_encounters();
        }
        deleted
    }

    /// Appends an encounter for an existing contact.
    pub fn add_encounter(&mut self, new: NewEncounter) -> Result<Encounter, StoreError> {
        let contact_id = new.contact_id();
        if !self.contact_pos.contains_key(&contact_id) {
            return Err(StoreError::MissingContact(contact_id));
        }

        let mut id = EncounterId::generate();
        while self.encounters.iter().any(|e| e.id == id) {
            id = EncounterId::generate();
        }

        let encounter = new.into_encounter(id);
        push_to_vec_index(&mut self.by_contact, contact_id, id);
        self.encounters.push(encounter.clone());
        debug!(%id, %contact_id, amount = encounter.amount.value(), "encounter added");

        self.persist_encounters();
        Ok(encounter)
    }

    /// Removes one encounter; its contact is untouched. Unknown ids are a no-op.
    pub fn delete_encounter(&mut self, id: EncounterId) -> Option<Encounter> {
        let Some(pos) = self.encounters.iter().position(|e| e.id == id) else {
            debug!(%id, "delete of unknown encounter ignored");
            return None;
        };

        let removed = self.encounters.remove(pos);
        remove_from_vec_index(&mut self.by_contact, &removed.contact_id, &id);
        debug!(%id, contact_id = %removed.contact_id, "encounter deleted");

        self.persist_encounters();
        Some(removed)
    }

    /// Contacts in insertion order.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Encounters in insertion order.
    pub fn encounters(&self) -> &[Encounter] {
        &self.encounters
    }

    /// Looks up one contact.
    pub fn contact(&self, id: ContactId) -> Option<&Contact> {
        self.contact_pos.get(&id).and_then(|pos| self.contacts.get(*pos))
    }

    /// Looks up one encounter.
    pub fn encounter(&self, id: EncounterId) -> Option<&Encounter> {
        self.encounters.iter().find(|e| e.id == id)
    }

    /// Encounter ids filed under `contact_id`, in insertion order.
    pub fn encounter_ids_for(&self, contact_id: ContactId) -> &[EncounterId] {
        self.by_contact
            .get(&contact_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Statistics over the current collections.
    pub fn stats(&self) -> Stats<'_> {
        Stats::new(&self.contacts, &self.encounters)
    }

    /// Active configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Saves that failed since the store was opened.
    pub fn persist_failures(&self) -> usize {
        self.persist_failures
    }

    fn reindex_contacts_from(&mut self, start: usize) {
        for (pos, contact) in self.contacts.iter().enumerate().skip(start) {
            self.contact_pos.insert(contact.id, pos);
        }
    }

    fn persist_contacts(&mut self) {
        let res = save_value(&mut *self.kv, &self.config.contacts_key, &self.contacts);
        self.record_persist_result(res, "contacts");
    }

    fn persist_encounters(&mut self) {
        let res = save_value(&mut *self.kv, &self.config.encounters_key, &self.encounters);
        self.record_persist_result(res, "encounters");
    }

    fn record_persist_result(&mut self, res: PersistResult<()>, what: &str) {
        if let Err(err) = res {
            self.persist_failures += 1;
            warn!(collection = what, error = %err, "persist failed, keeping in-memory state");
        }
    }
}
