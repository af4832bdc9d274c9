//! Shared primitive IDs and value types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque contact identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub Uuid);

/// Opaque encounter identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncounterId(pub Uuid);

impl ContactId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl EncounterId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for EncounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Money spent on an encounter. Always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Amount(f64);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(0.0);

    /// Returns `None` for negative, NaN or infinite values.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value >= 0.0).then_some(Self(value))
    }

    /// Raw value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Amount {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("invalid amount: {value}"))
    }
}

impl From<Amount> for f64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

/// Star rating between 1 and 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Lowest allowed star count.
    pub const MIN: u8 = 1;
    /// Highest allowed star count.
    pub const MAX: u8 = 5;

    /// Returns `None` outside `1..=5`.
    pub fn new(stars: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&stars).then_some(Self(stars))
    }

    /// Star count.
    pub fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("rating out of range: {value}"))
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

/// Reference to a contact photo: a remote URL or an inline `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(pub String);

impl PhotoRef {
    /// True when the image bytes are embedded in the reference.
    pub fn is_inline(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// Underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
