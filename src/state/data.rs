/// Shared data structures for the board state
///
/// These structs represent the data model that flows between
/// the ingestion pipeline, the drag machine and the UI layer.

use base64::Engine;
use image::ImageFormat;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Prefix of every encoded item source
const DATA_URI_PREFIX: &str = "data:";
/// Separator between the mime type and the base64 payload
const BASE64_MARKER: &str = ";base64,";

/// Opaque identity of an item, stable for the item's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies one drop target: the unsorted tray or a tier row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerId {
    Tray,
    /// Index into the configured tier list (0 = top tier)
    Tier(usize),
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerId::Tray => write!(f, "tray"),
            ContainerId::Tier(index) => write!(f, "tier[{}]", index),
        }
    }
}

/// Why a source could not be turned back into image bytes
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("source is not a data URI")]
    NotDataUri,
    #[error("data URI is not base64 encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Payload(#[from] base64::DecodeError),
}

/// Image payload encoded as a self-contained data URI
///
/// Two sources are equal only if their encoded text is byte-for-byte
/// identical, which is what external-drop de-duplication compares.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ImageSource(Arc<str>);

impl ImageSource {
    /// Encode raw image bytes of a known format as a data URI
    pub fn encode(format: ImageFormat, bytes: &[u8]) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        let uri = format!(
            "{}{}{}{}",
            DATA_URI_PREFIX,
            format.to_mime_type(),
            BASE64_MARKER,
            payload
        );
        ImageSource(uri.into())
    }

    /// The full data URI
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Mime type declared in the URI header, if well-formed
    pub fn mime_type(&self) -> Option<&str> {
        let rest = self.0.strip_prefix(DATA_URI_PREFIX)?;
        let end = rest.find(BASE64_MARKER)?;
        Some(&rest[..end])
    }

    /// Decode the base64 payload back into the original image bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, SourceError> {
        let rest = self.0.strip_prefix(DATA_URI_PREFIX).ok_or(SourceError::NotDataUri)?;
        let start = rest.find(BASE64_MARKER).ok_or(SourceError::NotBase64)?;
        let bytes = base64::engine::general_purpose::STANDARD.decode(&rest[start + BASE64_MARKER.len()..])?;
        Ok(bytes)
    }
}

// The payload can be megabytes long, keep debug output readable
impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSource")
            .field("mime", &self.mime_type().unwrap_or("?"))
            .field("len", &self.0.len())
            .finish()
    }
}

/// Represents a single image placed on the board
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub source: ImageSource,
}

/// An ordered drop target (tray or tier row)
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub id: ContainerId,
    /// Tier label, or the tray sentinel label
    pub label: String,
    /// Row color as RGB, used for the label cell and export
    pub color: [u8; 3],
    /// Items in visual left-to-right order
    pub items: Vec<ItemId>,
}

impl Container {
    pub fn new(id: ContainerId, label: impl Into<String>, color: [u8; 3]) -> Self {
        Self {
            id,
            label: label.into(),
            color,
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.items.contains(&item)
    }
}
