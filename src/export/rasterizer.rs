use ab_glyph::{point, Font, FontRef, PxScale, ScaleFont};
use image::{imageops, imageops::FilterType, DynamicImage, Rgba, RgbaImage};

use super::ExportError;

const BACKGROUND: Rgba<u8> = Rgba([0x1f, 0x1f, 0x1f, 0xff]);
/// Label glyph height relative to the cell edge
const LABEL_SCALE: f32 = 0.6;
/// Widest share of the cell a label may cover before it is shrunk
const LABEL_MAX_WIDTH: f32 = 0.9;

/// Embedded font for tier labels
static LABEL_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// Decoded pixels of one tier row
#[derive(Debug, Clone)]
pub struct RowPixels {
    pub label: String,
    pub color: [u8; 3],
    pub images: Vec<DynamicImage>,
}

/// Paints a set of rows into a single image buffer
pub trait Rasterizer {
    fn rasterize(&self, rows: &[RowPixels]) -> Result<RgbaImage, ExportError>;
}

/// Default layout: one band per row, a colored label cell on the left
/// followed by square item cells in row order.
#[derive(Debug, Clone, Copy)]
pub struct GridRasterizer {
    /// Edge of a label or item cell in pixels
    pub cell: u32,
    /// Vertical gap between rows
    pub gap: u32,
}

impl GridRasterizer {
    pub fn new(cell: u32) -> Self {
        Self { cell, gap: 2 }
    }

    /// Canvas size for the given rows
    pub fn canvas_size(&self, rows: &[RowPixels]) -> Result<(u32, u32), ExportError> {
        let too_large = || ExportError::Rasterize(format!("board too large for {}px cells", self.cell));

        let widest = rows.iter().map(|row| row.images.len()).max().unwrap_or(0).max(1);
        let columns = u32::try_from(widest).ok().and_then(|w| w.checked_add(1)).ok_or_else(too_large)?;
        let count = u32::try_from(rows.len()).map_err(|_| too_large())?;

        let width = self.cell.checked_mul(columns).ok_or_else(too_large)?;
        let height = self
            .cell
            .checked_mul(count)
            .and_then(|h| h.checked_add(self.gap.checked_mul(count.saturating_sub(1))?))
            .ok_or_else(too_large)?;
        Ok((width, height))
    }
}

impl Rasterizer for GridRasterizer {
    fn rasterize(&self, rows: &[RowPixels]) -> Result<RgbaImage, ExportError> {
        if rows.is_empty() {
            return Err(ExportError::Rasterize("board has no tier rows".to_string()));
        }
        if self.cell == 0 {
            return Err(ExportError::Rasterize("cell size must be positive".to_string()));
        }

        let font = FontRef::try_from_slice(LABEL_FONT)
            .map_err(|e| ExportError::Rasterize(format!("label font: {}", e)))?;

        let (width, height) = self.canvas_size(rows)?;
        let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);

        // Offsets below stay inside the canvas size checked above
        for (index, row) in rows.iter().enumerate() {
            let y = index as i64 * (self.cell as i64 + self.gap as i64);

            let label = paint_label(&font, &row.label, row.color, self.cell);
            imageops::replace(&mut canvas, &label, 0, y);

            for (column, img) in row.images.iter().enumerate() {
                let cell = img
                    .resize_to_fill(self.cell, self.cell, FilterType::Triangle)
                    .to_rgba8();
                let x = (column as i64 + 1) * self.cell as i64;
                imageops::overlay(&mut canvas, &cell, x, y);
            }
        }

        Ok(canvas)
    }
}

/// Label cell: the row color with the label centred in black
fn paint_label(font: &FontRef<'_>, text: &str, color: [u8; 3], size: u32) -> RgbaImage {
    let [r, g, b] = color;
    let mut cell = RgbaImage::from_pixel(size, size, Rgba([r, g, b, 0xff]));

    let advance = |scale: PxScale| -> f32 {
        let scaled = font.as_scaled(scale);
        text.chars().map(|c| scaled.h_advance(scaled.glyph_id(c))).sum()
    };

    let mut scale = PxScale::from(size as f32 * LABEL_SCALE);
    let max_width = size as f32 * LABEL_MAX_WIDTH;
    let natural = advance(scale);
    if natural <= 0.0 {
        return cell;
    }
    if natural > max_width {
        scale = PxScale::from(scale.y * max_width / natural);
    }

    let scaled = font.as_scaled(scale);
    let line_height = scaled.ascent() - scaled.descent();
    let baseline = (size as f32 - line_height) / 2.0 + scaled.ascent();
    let mut x_offset = (size as f32 - advance(scale)) / 2.0;

    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);
        let glyph = glyph_id.with_scale_and_position(scale, point(x_offset, baseline));

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = bounds.min.x as i32 + px as i32;
                let y = bounds.min.y as i32 + py as i32;
                if x < 0 || y < 0 || x >= size as i32 || y >= size as i32 {
                    return;
                }

                let keep = 1.0 - coverage.clamp(0.0, 1.0);
                let pixel = cell.get_pixel_mut(x as u32, y as u32);
                for channel in 0..3 {
                    pixel[channel] = (pixel[channel] as f32 * keep).round() as u8;
                }
            });
        }

        x_offset += scaled.h_advance(glyph_id);
    }

    cell
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, color: [u8; 3], images: usize) -> RowPixels {
        RowPixels {
            label: label.to_string(),
            color,
            images: (0..images)
                .map(|_| DynamicImage::ImageRgba8(RgbaImage::from_pixel(30, 20, Rgba([0, 0, 255, 255]))))
                .collect(),
        }
    }

    fn label_cell(canvas: &RgbaImage, raster: &GridRasterizer, index: u32) -> RgbaImage {
        let y = index * (raster.cell + raster.gap);
        imageops::crop_imm(canvas, 0, y, raster.cell, raster.cell).to_image()
    }

    #[test]
    fn test_canvas_fits_widest_row() {
        let raster = GridRasterizer::new(10);
        let rows = vec![row("S", [255, 0, 0], 3), row("A", [0, 255, 0], 0)];

        assert_eq!(raster.canvas_size(&rows).unwrap(), (40, 22));
        let canvas = raster.rasterize(&rows).unwrap();
        assert_eq!(canvas.dimensions(), (40, 22));
    }

    #[test]
    fn test_paints_label_background_and_items() {
        let raster = GridRasterizer::new(40);
        let rows = vec![row("S", [255, 0, 0], 1), row("A", [0, 255, 0], 0)];
        let canvas = raster.rasterize(&rows).unwrap();

        // Label corners keep the row color
        assert_eq!(*canvas.get_pixel(1, 1), Rgba([255, 0, 0, 255]));
        let item = canvas.get_pixel(60, 20);
        assert!(item[2] > 250 && item[0] < 5, "expected blue item cell, got {:?}", item);
        // Second row starts after the gap
        assert_eq!(*canvas.get_pixel(1, 43), Rgba([0, 255, 0, 255]));
        assert_eq!(*canvas.get_pixel(60, 60), BACKGROUND);
    }

    #[test]
    fn test_label_text_is_drawn() {
        let raster = GridRasterizer::new(40);
        let rows = vec![row("S", [200, 200, 200], 0), row("E", [200, 200, 200], 0)];
        let canvas = raster.rasterize(&rows).unwrap();

        let s = label_cell(&canvas, &raster, 0);
        let e = label_cell(&canvas, &raster, 1);
        assert_ne!(s, e, "labels with the same color must differ");

        let darkest = s.pixels().map(|p| p[0]).min().unwrap();
        assert!(darkest < 100, "expected dark glyph pixels, darkest was {}", darkest);
    }

    #[test]
    fn test_long_label_stays_inside_its_cell() {
        let raster = GridRasterizer::new(40);
        let rows = vec![row("Not ranked yet", [200, 200, 200], 1)];
        let canvas = raster.rasterize(&rows).unwrap();

        // The item cell to the right is untouched by the label
        let item = canvas.get_pixel(41, 20);
        assert!(item[2] > 250 && item[0] < 5, "label bled into item cell: {:?}", item);
    }

    #[test]
    fn test_empty_label_is_a_plain_swatch() {
        let raster = GridRasterizer::new(20);
        let canvas = raster.rasterize(&[row("", [10, 20, 30], 0)]).unwrap();

        let cell = label_cell(&canvas, &raster, 0);
        assert!(cell.pixels().all(|p| *p == Rgba([10, 20, 30, 255])));
    }

    #[test]
    fn test_oversized_cells_are_rejected() {
        let raster = GridRasterizer::new(u32::MAX / 2);
        let rows = vec![row("S", [255, 0, 0], 3)];

        assert!(matches!(raster.canvas_size(&rows), Err(ExportError::Rasterize(_))));
        assert!(matches!(raster.rasterize(&rows), Err(ExportError::Rasterize(_))));
    }

    #[test]
    fn test_no_rows_is_an_error() {
        assert!(GridRasterizer::new(10).rasterize(&[]).is_err());
    }
}
