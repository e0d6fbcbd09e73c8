//! Remote image references.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A stored image on the asset host.
///
/// `public_id` is the handle the host needs to delete the asset later;
/// `url` is what gets rendered. The pair is persisted as JSON on the user row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// Publicly reachable URL of the asset.
    pub url: String,
    /// Host-side identifier used for deletion.
    pub public_id: String,
}

impl ImageDescriptor {
    /// Build a descriptor from its parts.
    #[must_use]
    pub fn new(url: impl Into<String>, public_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            public_id: public_id.into(),
        }
    }
}

/// What a profile update wants done with the profile picture.
///
/// The caller decides this explicitly; the workflow never inspects the
/// submitted payload to guess whether an upload happened.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum ImageUpdate {
    /// Keep whatever image is currently stored.
    #[default]
    NoChange,
    /// Replace the stored image with these freshly submitted bytes.
    NewImage(Vec<u8>),
}

impl ImageUpdate {
    /// Treat an empty upload as "no change".
    #[must_use]
    pub fn from_upload(bytes: Option<Vec<u8>>) -> Self {
        match bytes {
            Some(bytes) if !bytes.is_empty() => Self::NewImage(bytes),
            _ => Self::NoChange,
        }
    }

    /// Whether new content was submitted.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        matches!(self, Self::NewImage(_))
    }
}

impl fmt::Debug for ImageUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoChange => f.write_str("NoChange"),
            Self::NewImage(bytes) => write!(f, "NewImage({} bytes)", bytes.len()),
        }
    }
}
