//! Form validation performed before anything reaches the store.
//!
//! Forms carry raw user input. `validate` turns them into the typed insert
//! payloads of [`crate::record`], or reports the first problem found.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::{
    record::{NewContact, NewEncounter},
    types::{Amount, ContactId, PhotoRef, Rating},
};

/// Default ceiling for uploaded photos (5 MiB).
pub const DEFAULT_MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Built-in avatars offered when no photo is uploaded.
pub const PRESET_AVATARS: [&str; 6] = [
    "https://images.unsplash.com/photo-1494790108377-be9c29b29330?w=200&h=200&fit=crop",
    "https://images.unsplash.com/photo-1534528741775-53994a69daeb?w=200&h=200&fit=crop",
    "https://images.unsplash.com/photo-1517841905240-472988babdf9?w=200&h=200&fit=crop",
    "https://images.unsplash.com/photo-1524504388940-b1c1722653e1?w=200&h=200&fit=crop",
    "https://images.unsplash.com/photo-1488426862026-3ee34a7d66df?w=200&h=200&fit=crop",
    "https://images.unsplash.com/photo-1502823403499-6ccfcf4fb453?w=200&h=200&fit=crop",
];

/// Rejected form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Contact name is empty after trimming.
    EmptyName,
    /// No contact selected for an encounter.
    MissingContact,
    /// Encounter location is empty after trimming.
    EmptyLocation,
    /// Amount is negative or infinite.
    InvalidAmount(String),
    /// Rating above the five-star scale.
    RatingOutOfRange(u8),
    /// Uploaded file is not an image.
    NotAnImage(String),
    /// Uploaded file exceeds the configured ceiling.
    PhotoTooLarge {
        /// Upload size in bytes.
        size: usize,
        /// Allowed size in bytes.
        max: usize,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name is required"),
            Self::MissingContact => write!(f, "select a contact"),
            Self::EmptyLocation => write!(f, "location is required"),
            Self::InvalidAmount(raw) => write!(f, "invalid amount: {raw}"),
            Self::RatingOutOfRange(stars) => {
                write!(f, "rating must be between 1 and 5, got {stars}")
            }
            Self::NotAnImage(mime) => write!(f, "file is not an image ({mime})"),
            Self::PhotoTooLarge { size, max } => {
                write!(f, "photo is {size} bytes, limit is {max}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Raw contact form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    /// Required name.
    pub name: String,
    /// Optional nickname; blank means absent.
    pub nickname: String,
    /// Optional phone; blank means absent.
    pub phone: String,
    /// Optional notes; blank means absent.
    pub notes: String,
    /// Selected photo; the first preset avatar when unset.
    pub photo: Option<PhotoRef>,
}

impl ContactForm {
    /// Validates the form into an insert payload.
    pub fn validate(&self) -> Result<NewContact, ValidationError> {
        let photo = self.photo.clone().unwrap_or_else(|| PhotoRef::preset(0));
        Ok(NewContact::new(&self.name, photo)?
            .with_nickname(&self.nickname)
            .with_phone(&self.phone)
            .with_notes(&self.notes))
    }
}

/// Raw encounter form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncounterForm {
    /// Selected contact.
    pub contact_id: Option<ContactId>,
    /// Required location.
    pub location: String,
    /// Amount as typed; unparsable text counts as zero.
    pub amount: String,
    /// Calendar day; today when unset.
    pub date: Option<NaiveDate>,
    /// Stars, 0 for no rating.
    pub rating: u8,
    /// Optional notes; blank means absent.
    pub notes: String,
}

impl EncounterForm {
    /// Validates the form into an insert payload. `today` fills a missing date.
    pub fn validate(&self, today: NaiveDate) -> Result<NewEncounter, ValidationError> {
        let contact_id = self.contact_id.ok_or(ValidationError::MissingContact)?;
        let date = start_of_day(self.date.unwrap_or(today));
        let amount = parse_amount(&self.amount)?;
        let rating = parse_rating(self.rating)?;

        Ok(NewEncounter::new(contact_id, &self.location, date)?
            .with_amount(amount)
            .with_rating(rating)
            .with_notes(&self.notes))
    }
}

/// Parses a typed amount. Text that is not a number yields zero.
pub fn parse_amount(raw: &str) -> Result<Amount, ValidationError> {
    let Ok(value) = raw.trim().parse::<f64>() else {
        return Ok(Amount::ZERO);
    };
    if value.is_nan() {
        return Ok(Amount::ZERO);
    }
    Amount::new(value).ok_or_else(|| ValidationError::InvalidAmount(raw.trim().to_string()))
}

/// Maps a star count to a rating; 0 means no rating.
pub fn parse_rating(stars: u8) -> Result<Option<Rating>, ValidationError> {
    if stars == 0 {
        return Ok(None);
    }
    Rating::new(stars)
        .map(Some)
        .ok_or(ValidationError::RatingOutOfRange(stars))
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

impl PhotoRef {
    /// One of the [`PRESET_AVATARS`]; out-of-range indexes wrap around.
    pub fn preset(index: usize) -> Self {
        Self(PRESET_AVATARS[index % PRESET_AVATARS.len()].to_string())
    }

    /// Embeds an uploaded image as a base64 `data:` URL.
    pub fn from_upload(
        mime: &str,
        bytes: &[u8],
        max_bytes: usize,
    ) -> Result<Self, ValidationError> {
        let mime = mime.trim().to_ascii_lowercase();
        if !mime.starts_with("image/") {
            return Err(ValidationError::NotAnImage(mime));
        }
        if bytes.len() > max_bytes {
            return Err(ValidationError::PhotoTooLarge {
                size: bytes.len(),
                max: max_bytes,
            });
        }
        Ok(Self(format!("data:{mime};base64,{}", STANDARD.encode(bytes))))
    }
}
