//! Contact and encounter records plus their validated insert payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    input::ValidationError,
    types::{Amount, ContactId, EncounterId, PhotoRef, Rating},
};

/// A tracked person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Stable contact identifier.
    pub id: ContactId,
    /// Display name, trimmed and non-empty.
    pub name: String,
    /// Avatar reference.
    pub photo: PhotoRef,
    /// Optional nickname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Optional phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Optional free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A dated, located event tied to one [`Contact`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    /// Stable encounter identifier.
    pub id: EncounterId,
    /// Owning contact.
    pub contact_id: ContactId,
    /// When the encounter happened.
    pub date: DateTime<Utc>,
    /// Where it happened, trimmed and non-empty.
    pub location: String,
    /// Money spent.
    pub amount: Amount,
    /// Optional star rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    /// Optional free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Insert payload used to create a new [`Contact`].
///
/// Only constructible with a non-empty name, so the store never sees one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub(crate) name: String,
    pub(crate) photo: PhotoRef,
    pub(crate) nickname: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) notes: Option<String>,
}

impl NewContact {
    /// Trims `name` and rejects it when empty.
    pub fn new(name: &str, photo: PhotoRef) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self {
            name: name.to_string(),
            photo,
            nickname: None,
            phone: None,
            notes: None,
        })
    }

    /// Sets the nickname; blank input clears it.
    pub fn with_nickname(mut self, nickname: &str) -> Self {
        self.nickname = non_blank(nickname);
        self
    }

    /// Sets the phone number; blank input clears it.
    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = non_blank(phone);
        self
    }

    /// Sets the notes; blank input clears them.
    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = non_blank(notes);
        self
    }

    /// Trimmed name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_contact(self, id: ContactId, created_at: DateTime<Utc>) -> Contact {
        Contact {
            id,
            name: self.name,
            photo: self.photo,
            nickname: self.nickname,
            phone: self.phone,
            notes: self.notes,
            created_at,
        }
    }
}

/// Insert payload used to create a new [`Encounter`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewEncounter {
    pub(crate) contact_id: ContactId,
    pub(crate) date: DateTime<Utc>,
    pub(crate) location: String,
    pub(crate) amount: Amount,
    pub(crate) rating: Option<Rating>,
    pub(crate) notes: Option<String>,
}

impl NewEncounter {
    /// Trims `location` and rejects it when empty. Amount starts at zero.
    pub fn new(
        contact_id: ContactId,
        location: &str,
        date: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(ValidationError::EmptyLocation);
        }
        Ok(Self {
            contact_id,
            date,
            location: location.to_string(),
            amount: Amount::ZERO,
            rating: None,
            notes: None,
        })
    }

    /// Sets the amount spent.
    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = amount;
        self
    }

    /// Sets or clears the rating.
    pub fn with_rating(mut self, rating: Option<Rating>) -> Self {
        self.rating = rating;
        self
    }

    /// Sets the notes; blank input clears them.
    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = non_blank(notes);
        self
    }

    /// Referenced contact.
    pub fn contact_id(&self) -> ContactId {
        self.contact_id
    }

    pub(crate) fn into_encounter(self, id: EncounterId) -> Encounter {
        Encounter {
            id,
            contact_id: self.contact_id,
            date: self.date,
            location: self.location,
            amount: self.amount,
            rating: self.rating,
            notes: self.notes,
        }
    }
}

pub(crate) fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
