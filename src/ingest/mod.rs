/// Ingestion pipeline
///
/// This module handles:
/// - Decoding external blobs into data-URI sources (decode.rs)
/// - Turning a decoded blob into a tray item, with the duplicate policy of
///   its entry point
/// - Tracking the file-drop candidate while an OS drag hovers the window

pub mod decode;

use thiserror::Error;

use crate::state::{Board, ContainerId, ItemId};

pub use decode::{decode_blob, DecodedImage, RawBlob};

/// Why a single blob never became an item
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("failed to read {name}: {reason}")]
    Read { name: String, reason: String },
    #[error("{name} is not a recognized image format")]
    UnknownFormat { name: String },
    #[error("failed to decode {name}: {reason}")]
    Decode { name: String, reason: String },
    #[error("decode task failed: {0}")]
    Task(String),
}

/// Where a blob came from; decides the duplicate policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOrigin {
    /// File picker: the user chose these files, every one becomes an item
    LocalSelection,
    /// OS drag-drop: payloads may repeat, exact duplicates are skipped
    ExternalDrop,
}

impl IngestOrigin {
    pub fn deduplicates(self) -> bool {
        matches!(self, IngestOrigin::ExternalDrop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Added(ItemId),
    /// Source already on the board; nothing created
    Duplicate,
}

/// Create and place one item for a completed decode.
///
/// This is the only step a decode completion performs, so completions that
/// interleave with drags or other decodes cannot corrupt the board.
pub fn accept(board: &mut Board, origin: IngestOrigin, decoded: DecodedImage) -> IngestOutcome {
    if origin.deduplicates() && board.contains_source(&decoded.source) {
        tracing::debug!("Skipping duplicate drop of {}", decoded.name);
        return IngestOutcome::Duplicate;
    }

    let DecodedImage { name, source } = decoded;
    let id = board.add_item(source);
    tracing::info!("Added {} as item {} ({:?})", name, id, origin);
    IngestOutcome::Added(id)
}

/// Container marked while an external file drag hovers the window
#[derive(Debug, Clone)]
pub struct FileDropZone {
    target: ContainerId,
    hovering: bool,
}

impl FileDropZone {
    pub fn new(target: ContainerId) -> Self {
        Self {
            target,
            hovering: false,
        }
    }

    pub fn hover(&mut self) {
        self.hovering = true;
    }

    pub fn leave(&mut self) {
        self.hovering = false;
    }

    /// A file landed; the mark is cleared either way
    pub fn dropped(&mut self) {
        self.hovering = false;
    }

    /// The container to highlight as file-drop candidate, if any
    pub fn candidate(&self) -> Option<ContainerId> {
        self.hovering.then_some(self.target)
    }
}
