//! Content-addressed event identifier.
//!
//! Unlike a random or time-ordered UUID, an [`EventId`] is derived from the
//! event's content, so two writers that observe the same logical event
//! converge on the same row.

use serde::{Deserialize, Serialize};

/// Lowercase-hex SHA-256 digest identifying an event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Render a raw digest as an identifier.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// Borrow the hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the inner hex string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
