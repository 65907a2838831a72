#![forbid(unsafe_code)]
//! Rasterization of module grids.
//!
//! Grids are drawn onto a white square canvas, one black block per dark module. Besides the
//! plain render this module provides the fallback pattern returned when a grid could not be
//! built, and a logo overlay that stamps a labeled square over the center of a render.
use image::{GrayImage, ImageBuffer, Luma};
use log::debug;

use crate::error::{Error, Result};
use crate::font;
use crate::matrix::{ModuleGrid, Placement};

/// A rendered square bitmap, black modules on white.
pub type Bitmap = GrayImage;

pub const BLACK: Luma<u8> = Luma([0u8]);
pub const WHITE: Luma<u8> = Luma([255u8]);

/// Caption drawn under the fallback checkerboard.
pub const FALLBACK_CAPTION: &str = "QR Code";

/// Label used by [`generate`](crate::helper::generate) when a logo is requested without text.
pub const DEFAULT_LOGO_LABEL: &str = "AO";

const FALLBACK_INSET: f64 = 10.0;
const FALLBACK_PATTERN_INSET: f64 = 20.0;
const FALLBACK_BLOCKS: u32 = 8;
const FALLBACK_CAPTION_PX: f64 = 12.0;
const OUTLINE_WIDTH: f64 = 2.0;
const LOGO_FRACTION: f64 = 0.2;
const LOGO_PADDING: f64 = 2.0;

/// Size of one module in pixels for a grid of side `grid_size` on a `pixel_size` canvas.
///
/// Stretched placement divides exactly, centered placement floors to whole pixels.
pub fn module_size(pixel_size: u32, grid_size: usize, placement: Placement) -> f64 {
    let exact = f64::from(pixel_size) / grid_size as f64;
    match placement {
        Placement::Stretched => exact,
        Placement::Centered => exact.floor(),
    }
}

/// Margin left on each side when a grid is centered with whole-pixel modules.
///
/// Equals half of `pixel_size % grid_size`, so it is non-negative and below `grid_size / 2`
/// whatever the module size.
pub fn centered_offset(pixel_size: u32, grid_size: usize) -> f64 {
    let module = module_size(pixel_size, grid_size, Placement::Centered);
    (f64::from(pixel_size) - grid_size as f64 * module) / 2.0
}

/// Position and side of the logo square on a canvas, in pixels.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct LogoGeometry {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl LogoGeometry {
    pub fn for_canvas(pixel_size: u32) -> Self {
        let canvas = f64::from(pixel_size);
        let size = canvas * LOGO_FRACTION;
        let origin = (canvas - size) / 2.0;
        Self {
            x: origin,
            y: origin,
            size,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.size / 2.0, self.y + self.size / 2.0)
    }
}

/// Draws `grid` on a white `pixel_size` square, placed as its [`GridSpec`] dictates.
///
/// With centered placement the module size is floored to whole pixels, so a canvas smaller
/// than the grid side yields an all-white bitmap.
///
/// [`GridSpec`]: crate::matrix::GridSpec
///
/// # Errors
///
/// Returns [`Error::InvalidPixelSize`] if `pixel_size` is zero.
///
/// # Example
///
/// ```rust
/// use qrpattern::matrix::{ModuleGrid, Variant};
/// use qrpattern::render::render;
///
/// let grid = ModuleGrid::build("Hello, World!", Variant::Standard);
/// let img = render(&grid, 300).unwrap();
/// assert_eq!(img.dimensions(), (300, 300));
/// ```
pub fn render(grid: &ModuleGrid, pixel_size: u32) -> Result<Bitmap> {
    let mut canvas = Canvas::new(pixel_size)?;
    let n = grid.size();
    let placement = grid.spec().placement();
    let module = module_size(pixel_size, n, placement);
    let offset = match placement {
        Placement::Stretched => 0.0,
        Placement::Centered => centered_offset(pixel_size, n),
    };
    debug!(
        "rendering {}x{} grid at {}px, module {:.3}px, offset {:.1}px",
        n, n, pixel_size, module, offset
    );
    for (y, row) in grid.rows().enumerate() {
        for (x, &dark) in row.iter().enumerate() {
            if dark {
                canvas.fill_rect(
                    offset + x as f64 * module,
                    offset + y as f64 * module,
                    module,
                    module,
                    BLACK,
                );
            }
        }
    }
    Ok(canvas.into_image())
}

/// Draws the fixed placeholder pattern used when no grid is available.
///
/// The result does not depend on any input text: an outlined border inset by 10 pixels, an
/// 8×8 checkerboard and the caption [`FALLBACK_CAPTION`].
///
/// # Errors
///
/// Returns [`Error::InvalidPixelSize`] if `pixel_size` is zero.
pub fn render_fallback(pixel_size: u32) -> Result<Bitmap> {
    let mut canvas = Canvas::new(pixel_size)?;
    let size = f64::from(pixel_size);

    canvas.stroke_rect(
        FALLBACK_INSET,
        FALLBACK_INSET,
        size - 2.0 * FALLBACK_INSET,
        size - 2.0 * FALLBACK_INSET,
        OUTLINE_WIDTH,
        BLACK,
    );

    let block = (size - 2.0 * FALLBACK_PATTERN_INSET) / f64::from(FALLBACK_BLOCKS);
    for i in 0..FALLBACK_BLOCKS {
        for j in 0..FALLBACK_BLOCKS {
            if (i + j) % 2 == 0 {
                canvas.fill_rect(
                    FALLBACK_PATTERN_INSET + f64::from(i) * block,
                    FALLBACK_PATTERN_INSET + f64::from(j) * block,
                    block - OUTLINE_WIDTH,
                    block - OUTLINE_WIDTH,
                    BLACK,
                );
            }
        }
    }

    // Caption sits on a baseline 10px above the bottom edge.
    let scale = text_scale(FALLBACK_CAPTION_PX);
    let top = size - FALLBACK_INSET - f64::from(font::GLYPH_HEIGHT * scale);
    canvas.draw_text(FALLBACK_CAPTION, size / 2.0, top, scale, BLACK);
    Ok(canvas.into_image())
}

/// Renders `grid` and stamps a labeled square over its center.
///
/// The square covers 20% of the canvas side, is cleared to white with a 2 pixel margin and
/// outlined in black. Modules underneath are lost.
///
/// # Errors
///
/// Returns [`Error::InvalidPixelSize`] if `pixel_size` is zero.
pub fn render_with_logo(grid: &ModuleGrid, pixel_size: u32, label: &str) -> Result<Bitmap> {
    let img = render(grid, pixel_size)?;
    Ok(overlay_logo(img, label))
}

/// Stamps the logo square and `label` onto an existing square bitmap.
pub fn overlay_logo(img: Bitmap, label: &str) -> Bitmap {
    let mut canvas = Canvas { img };
    let logo = LogoGeometry::for_canvas(canvas.img.width());
    canvas.fill_rect(
        logo.x - LOGO_PADDING,
        logo.y - LOGO_PADDING,
        logo.size + 2.0 * LOGO_PADDING,
        logo.size + 2.0 * LOGO_PADDING,
        WHITE,
    );
    canvas.stroke_rect(logo.x, logo.y, logo.size, logo.size, OUTLINE_WIDTH, BLACK);

    let scale = text_scale(logo.size / 3.0);
    let (cx, cy) = logo.center();
    let top = cy - f64::from(font::GLYPH_HEIGHT * scale) / 2.0;
    canvas.draw_text(label, cx, top, scale, BLACK);
    canvas.into_image()
}

// Integer glyph scale whose height best matches `px`.
fn text_scale(px: f64) -> u32 {
    ((px / f64::from(font::GLYPH_HEIGHT)).round() as u32).max(1)
}

/// White square canvas with pixel-snapped drawing primitives.
struct Canvas {
    img: Bitmap,
}

impl Canvas {
    fn new(pixel_size: u32) -> Result<Self> {
        if pixel_size == 0 {
            return Err(Error::InvalidPixelSize(pixel_size));
        }
        Ok(Self {
            img: ImageBuffer::from_pixel(pixel_size, pixel_size, WHITE),
        })
    }

    fn into_image(self) -> Bitmap {
        self.img
    }

    // Edges are rounded to the nearest pixel boundary so adjacent rectangles tile exactly.
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Luma<u8>) {
        let (w, h) = (f64::from(self.img.width()), f64::from(self.img.height()));
        let left = x.round().clamp(0.0, w) as u32;
        let right = (x + width).round().clamp(0.0, w) as u32;
        let top = y.round().clamp(0.0, h) as u32;
        let bottom = (y + height).round().clamp(0.0, h) as u32;
        for py in top..bottom {
            for px in left..right {
                self.img.put_pixel(px, py, color);
            }
        }
    }

    // Outline centered on the rectangle's edges.
    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64, line: f64, color: Luma<u8>) {
        if width < 0.0 || height < 0.0 {
            return;
        }
        let half = line / 2.0;
        self.fill_rect(x - half, y - half, width + line, line, color);
        self.fill_rect(x - half, y + height - half, width + line, line, color);
        self.fill_rect(x - half, y - half, line, height + line, color);
        self.fill_rect(x + width - half, y - half, line, height + line, color);
    }

    // Glyphs wholly outside the canvas are skipped.
    fn draw_text(&mut self, text: &str, center_x: f64, top: f64, scale: u32, color: Luma<u8>) {
        let left = (center_x - font::text_width(text, scale) as f64 / 2.0).round();
        let top = top.round();
        let cell = f64::from(scale);
        let advance = f64::from(font::ADVANCE) * cell;
        let right_edge = f64::from(self.img.width());
        for (i, c) in text.chars().enumerate() {
            let origin = left + i as f64 * advance;
            if origin >= right_edge {
                break;
            }
            if origin + advance <= 0.0 {
                continue;
            }
            let rows = font::glyph(c);
            for row in 0..font::GLYPH_HEIGHT {
                for col in 0..font::GLYPH_WIDTH {
                    if font::glyph_pixel(&rows, col, row) {
                        self.fill_rect(
                            origin + f64::from(col) * cell,
                            top + f64::from(row) * cell,
                            cell,
                            cell,
                            color,
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Variant;

    fn black_pixels(img: &Bitmap) -> usize {
        img.pixels().filter(|p| **p == BLACK).count()
    }

    #[test]
    fn test_rejects_zero_pixel_size() {
        let grid = ModuleGrid::build("zero", Variant::Standard);
        assert!(matches!(
            render(&grid, 0),
            Err(Error::InvalidPixelSize(0))
        ));
        assert!(matches!(render_fallback(0), Err(Error::InvalidPixelSize(0))));
    }

    #[test]
    fn test_standard_modules_are_twelve_pixels_at_300() {
        let grid = ModuleGrid::build("scaling", Variant::Standard);
        let img = render(&grid, 300).unwrap();
        assert_eq!(img.dimensions(), (300, 300));
        for (x, y, pixel) in img.enumerate_pixels() {
            let dark = grid.get_module((x / 12) as i32, (y / 12) as i32);
            assert_eq!(*pixel == BLACK, dark, "pixel ({}, {})", x, y);
        }
        assert_eq!(black_pixels(&img), grid.dark_count() * 144);
    }

    #[test]
    fn test_centered_offset() {
        assert_eq!(module_size(100, 21, Placement::Centered), 4.0);
        assert_eq!(centered_offset(100, 21), 8.0);
        assert_eq!(centered_offset(101, 21), 8.5);
        for size in 1..400u32 {
            let offset = centered_offset(size, 21);
            assert!(offset >= 0.0);
            assert_eq!(2.0 * offset, f64::from(size % 21));
            assert!(offset < 21.0 / 2.0);
        }
    }

    #[test]
    fn test_centered_render_places_grid() {
        let grid = ModuleGrid::build("centered", Variant::Enhanced);
        let img = render(&grid, 100).unwrap();
        assert_eq!(img.dimensions(), (100, 100));
        // Margin is white, first finder module starts at the offset.
        assert_eq!(*img.get_pixel(7, 7), WHITE);
        assert_eq!(*img.get_pixel(8, 8), BLACK);
        assert_eq!(*img.get_pixel(91, 8), BLACK);
        assert_eq!(*img.get_pixel(92, 8), WHITE);
        assert_eq!(black_pixels(&img), grid.dark_count() * 16);
    }

    #[test]
    fn test_fallback_is_text_independent() {
        let img = render_fallback(200).unwrap();
        assert_eq!(img.dimensions(), (200, 200));
        assert_eq!(img, render_fallback(200).unwrap());
        // Border stroke and first checker block.
        assert_eq!(*img.get_pixel(100, 10), BLACK);
        assert_eq!(*img.get_pixel(25, 25), BLACK);
        assert_eq!(*img.get_pixel(0, 0), WHITE);
    }

    #[test]
    fn test_fallback_tiny_canvas() {
        let img = render_fallback(1).unwrap();
        assert_eq!(img.dimensions(), (1, 1));
    }

    #[test]
    fn test_logo_geometry() {
        let logo = LogoGeometry::for_canvas(300);
        assert_eq!(logo.size, 60.0);
        assert_eq!((logo.x, logo.y), (120.0, 120.0));
        assert_eq!(logo.center(), (150.0, 150.0));
    }

    #[test]
    fn test_logo_clears_center() {
        let grid = ModuleGrid::build("logo", Variant::Enhanced);
        let img = render_with_logo(&grid, 300, "").unwrap();
        // Outline covers 119..121, interior is white.
        for i in 121..179 {
            assert_eq!(*img.get_pixel(i, 150), WHITE);
        }
        assert_eq!(*img.get_pixel(119, 150), BLACK);
        assert_eq!(*img.get_pixel(180, 150), BLACK);
        assert_eq!(*img.get_pixel(150, 120), BLACK);
    }

    #[test]
    fn test_logo_label_drawn() {
        let grid = ModuleGrid::build("logo", Variant::Standard);
        let blank = render_with_logo(&grid, 300, "").unwrap();
        let labeled = render_with_logo(&grid, 300, "AO").unwrap();
        assert!(black_pixels(&labeled) > black_pixels(&blank));
    }

    #[test]
    fn test_long_label_is_clipped() {
        let grid = ModuleGrid::build("logo", Variant::Enhanced);
        let label = "A".repeat(20_000);
        let img = render_with_logo(&grid, 3000, &label).unwrap();
        assert_eq!(img.dimensions(), (3000, 3000));
        assert!(black_pixels(&img) > 0);
    }

    #[test]
    fn test_placement_follows_grid() {
        let standard = ModuleGrid::build("placement", Variant::Standard);
        let enhanced = ModuleGrid::build("placement", Variant::Enhanced);
        // 110 is not a multiple of 21, so a centered grid leaves a white margin.
        let stretched = render(&standard, 110).unwrap();
        let centered = render(&enhanced, 110).unwrap();
        assert_eq!(*stretched.get_pixel(0, 0), BLACK);
        assert_eq!(centered_offset(110, 21), 2.5);
        assert_eq!(*centered.get_pixel(0, 0), WHITE);
        assert_eq!(*centered.get_pixel(2, 2), WHITE);
        assert_eq!(*centered.get_pixel(3, 3), BLACK);
    }

    #[test]
    fn test_centered_canvas_smaller_than_grid_is_white() {
        let grid = ModuleGrid::build("tiny", Variant::Enhanced);
        let img = render(&grid, 20).unwrap();
        assert_eq!(img.dimensions(), (20, 20));
        assert_eq!(black_pixels(&img), 0);
    }
}
