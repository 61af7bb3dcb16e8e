/// Board export
///
/// Decodes every tier-row item of a snapshot, hands the pixels to a
/// `Rasterizer` and writes the result as a PNG. Any failure aborts the whole
/// export and leaves no file behind; the board itself is never touched.

pub mod rasterizer;

use image::ImageFormat;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::state::BoardSnapshot;

pub use rasterizer::{GridRasterizer, Rasterizer, RowPixels};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportError {
    #[error("an image in tier {row} could not be decoded: {reason}")]
    Decode { row: String, reason: String },
    #[error("rasterizer failed: {0}")]
    Rasterize(String),
    #[error("failed to encode PNG: {0}")]
    Encode(String),
    #[error("failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },
    #[error("export task failed: {0}")]
    Task(String),
}

/// Directory the save dialog opens in
pub fn default_export_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Decode the snapshot's sources into paintable rows
fn decode_rows(snapshot: &BoardSnapshot) -> Result<Vec<RowPixels>, ExportError> {
    snapshot
        .rows
        .iter()
        .map(|row| {
            let images = row
                .sources
                .iter()
                .map(|source| {
                    let bytes = source.to_bytes().map_err(|e| e.to_string())?;
                    image::load_from_memory(&bytes).map_err(|e| e.to_string())
                })
                .collect::<Result<Vec<_>, String>>()
                .map_err(|reason| ExportError::Decode {
                    row: row.label.clone(),
                    reason,
                })?;

            Ok(RowPixels {
                label: row.label.clone(),
                color: row.color,
                images,
            })
        })
        .collect()
}

/// Render the snapshot to PNG bytes in memory
pub fn render_png(snapshot: &BoardSnapshot, rasterizer: &dyn Rasterizer) -> Result<Vec<u8>, ExportError> {
    let rows = decode_rows(snapshot)?;
    let canvas = rasterizer.rasterize(&rows)?;

    let mut out = Cursor::new(Vec::new());
    canvas
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

/// Write bytes next to `path` and move them into place in one step
fn write_atomic(bytes: &[u8], path: &Path) -> Result<(), ExportError> {
    let write_error = |reason: String| ExportError::Write {
        path: path.to_path_buf(),
        reason,
    };

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| write_error(e.to_string()))?;
    tmp.write_all(bytes).map_err(|e| write_error(e.to_string()))?;
    tmp.persist(path).map_err(|e| write_error(e.error.to_string()))?;
    Ok(())
}

/// Render and save the board
pub fn export_board(
    snapshot: &BoardSnapshot,
    rasterizer: &dyn Rasterizer,
    path: &Path,
) -> Result<PathBuf, ExportError> {
    let png = render_png(snapshot, rasterizer)?;
    write_atomic(&png, path)?;

    tracing::info!("Exported board ({} KB) to {}", png.len() / 1024, path.display());
    Ok(path.to_path_buf())
}

/// Export on the blocking pool with the default grid layout
pub async fn export_board_async(
    snapshot: BoardSnapshot,
    cell_size: u32,
    path: PathBuf,
) -> Result<PathBuf, ExportError> {
    tokio::task::spawn_blocking(move || {
        export_board(&snapshot, &GridRasterizer::new(cell_size), &path)
    })
    .await
    .map_err(|e| ExportError::Task(e.to_string()))?
}
