/// Blob decoding
///
/// Turns a raw image blob (a file on disk or bytes already in memory) into
/// a data-URI source. The pixels are fully decoded once so that only
/// paintable images ever reach the board.

use std::path::PathBuf;
use tokio::task;

use super::IngestError;
use crate::state::ImageSource;

/// An external image blob waiting to be decoded
#[derive(Debug, Clone)]
pub enum RawBlob {
    File(PathBuf),
    Bytes { name: String, bytes: Vec<u8> },
}

impl RawBlob {
    /// Short name used in logs and status messages
    pub fn name(&self) -> String {
        match self {
            RawBlob::File(path) => path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            RawBlob::Bytes { name, .. } => name.clone(),
        }
    }
}

/// A successfully decoded blob, ready to become an item
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub name: String,
    pub source: ImageSource,
}

/// Decode one blob
///
/// Reading happens on tokio's fs pool and decoding on the blocking pool, so
/// the UI stays responsive while large images are processed.
pub async fn decode_blob(blob: RawBlob) -> Result<DecodedImage, IngestError> {
    let name = blob.name();
    let bytes = match blob {
        RawBlob::File(path) => tokio::fs::read(&path).await.map_err(|e| IngestError::Read {
            name: name.clone(),
            reason: e.to_string(),
        })?,
        RawBlob::Bytes { bytes, .. } => bytes,
    };

    task::spawn_blocking(move || decode_bytes(name, &bytes))
        .await
        .map_err(|e| IngestError::Task(e.to_string()))?
}

/// Blocking implementation of blob decoding
pub fn decode_bytes(name: String, bytes: &[u8]) -> Result<DecodedImage, IngestError> {
    let format = image::guess_format(bytes).map_err(|_| IngestError::UnknownFormat {
        name: name.clone(),
    })?;

    let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| {
        IngestError::Decode {
            name: name.clone(),
            reason: e.to_string(),
        }
    })?;

    tracing::debug!(
        "Decoded {} as {:?} ({}x{})",
        name,
        format,
        decoded.width(),
        decoded.height()
    );

    Ok(DecodedImage {
        source: ImageSource::encode(format, bytes),
        name,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    /// Encode a solid-color square as PNG bytes
    pub(crate) fn png_bytes(size: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(size, size, Rgba(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png_bytes() {
        let bytes = png_bytes(4, [255, 0, 0, 255]);
        let decoded = decode_bytes("red.png".to_string(), &bytes).unwrap();

        assert_eq!(decoded.name, "red.png");
        assert_eq!(decoded.source.mime_type(), Some("image/png"));
        assert_eq!(decoded.source.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let err = decode_bytes("notes.txt".to_string(), b"hello world").unwrap_err();
        assert!(matches!(err, IngestError::UnknownFormat { .. }));
    }

    #[test]
    fn test_truncated_image_fails_to_decode() {
        let bytes = png_bytes(16, [0, 0, 255, 255]);
        let err = decode_bytes("cut.png".to_string(), &bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, IngestError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_decode_file_blob() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("green.png");
        std::fs::write(&path, png_bytes(8, [0, 255, 0, 255])).unwrap();

        let decoded = decode_blob(RawBlob::File(path)).await.unwrap();
        assert_eq!(decoded.name, "green.png");
    }

    #[tokio::test]
    async fn test_missing_file_is_a_read_error() {
        let result = decode_blob(RawBlob::File("/nonexistent/path.png".into())).await;
        assert!(matches!(result, Err(IngestError::Read { .. })));
    }
}
