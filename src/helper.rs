use std::io::Cursor;

use image::ImageFormat;
use log::{debug, warn};

use crate::error::{BuildError, Error, Result};
use crate::matrix::{GridSpec, ModuleGrid, Variant};
use crate::render::{self, Bitmap, DEFAULT_LOGO_LABEL};

/*---- Generation ----*/

/// Options for [`generate`].
///
/// # Example
///
/// ```rust
/// use qrpattern::helper::GenerateOptions;
/// use qrpattern::matrix::Variant;
///
/// let options = GenerateOptions {
///     pixel_size: 300,
///     variant: Variant::Enhanced,
///     ..Default::default()
/// };
/// assert!(options.logo_label.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Side of the output bitmap in pixels, must be greater than zero.
    pub pixel_size: u32,
    pub variant: Variant,
    /// Text stamped in a square over the center of the code, if any.
    pub logo_label: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            pixel_size: 200,
            variant: Variant::Standard,
            logo_label: None,
        }
    }
}

impl GenerateOptions {
    pub fn new(pixel_size: u32, variant: Variant) -> Self {
        Self {
            pixel_size,
            variant,
            logo_label: None,
        }
    }

    pub fn with_logo(mut self, label: impl Into<String>) -> Self {
        self.logo_label = Some(label.into());
        self
    }

    /// Requests the logo overlay with the stock label.
    pub fn with_default_logo(self) -> Self {
        self.with_logo(DEFAULT_LOGO_LABEL)
    }
}

/// Outcome of building a grid: either the grid itself or the reason the fallback is due.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Generation {
    Matrix(ModuleGrid),
    Fallback(BuildError),
}

impl Generation {
    pub fn new(text: &str, spec: GridSpec) -> Self {
        match ModuleGrid::try_build(text, spec) {
            Ok(grid) => Generation::Matrix(grid),
            Err(err) => {
                warn!("matrix construction failed, using fallback pattern: {}", err);
                Generation::Fallback(err)
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Generation::Fallback(_))
    }

    /// Rasterizes the outcome. A fallback always yields the placeholder pattern and ignores
    /// `logo_label`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPixelSize`] if `pixel_size` is zero.
    pub fn render(self, pixel_size: u32, logo_label: Option<&str>) -> Result<Rendered> {
        match self {
            Generation::Matrix(grid) => {
                let bitmap = match logo_label {
                    Some(label) => render::render_with_logo(&grid, pixel_size, label)?,
                    None => render::render(&grid, pixel_size)?,
                };
                Ok(Rendered {
                    bitmap,
                    grid: Some(grid),
                })
            }
            Generation::Fallback(_) => Ok(Rendered {
                bitmap: render::render_fallback(pixel_size)?,
                grid: None,
            }),
        }
    }
}

/// A rendered code together with the grid it was drawn from.
#[derive(Clone, Debug)]
pub struct Rendered {
    pub bitmap: Bitmap,
    /// `None` when the fallback pattern was drawn.
    pub grid: Option<ModuleGrid>,
}

impl Rendered {
    pub fn is_fallback(&self) -> bool {
        self.grid.is_none()
    }
}

/// Generates the bitmap for `payload`.
///
/// Construction failures are absorbed into the fallback pattern, so every call with valid
/// options returns a bitmap of side `options.pixel_size`.
///
/// # Errors
///
/// Returns [`Error::InvalidPixelSize`] if `options.pixel_size` is zero.
///
/// # Example
///
/// ```rust
/// use qrpattern::helper::{generate, GenerateOptions};
///
/// let rendered = generate("Hello, World!", &GenerateOptions::default()).unwrap();
/// assert_eq!(rendered.bitmap.dimensions(), (200, 200));
/// assert_eq!(rendered.grid.unwrap().size(), 25);
/// ```
pub fn generate(payload: &str, options: &GenerateOptions) -> Result<Rendered> {
    if options.pixel_size == 0 {
        return Err(Error::InvalidPixelSize(options.pixel_size));
    }
    debug!(
        "generating {} code at {}px for {} byte payload",
        options.variant,
        options.pixel_size,
        payload.len()
    );
    Generation::new(payload, options.variant.spec())
        .render(options.pixel_size, options.logo_label.as_deref())
}

/// Builds the `title|date|start|lat,lon|id` payload encoded for a meeting.
///
/// # Example
///
/// ```rust
/// use qrpattern::helper::meeting_payload;
///
/// let payload = meeting_payload("Meeting", "2025-01-01", "09:00", 28.7041, 77.1025, "meeting_1");
/// assert_eq!(payload, "Meeting|2025-01-01|09:00|28.7041,77.1025|meeting_1");
/// ```
pub fn meeting_payload(
    title: &str,
    date: &str,
    start_time: &str,
    latitude: f64,
    longitude: f64,
    id: &str,
) -> String {
    format!("{}|{}|{}|{},{}|{}", title, date, start_time, latitude, longitude, id)
}

/*---- Output formats ----*/

/// Encodes a bitmap as PNG bytes, ready for download or printing.
///
/// # Errors
///
/// Returns [`Error::Image`] if the encoder fails.
pub fn encode_png(bitmap: &Bitmap) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    bitmap.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

// Returns a string of SVG code for an image depicting
// the given grid, with the given number of border modules.
// The string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg_string(grid: &ModuleGrid, border: u32) -> String {
    let border = border as usize;
    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    let dimension = grid.size() + border * 2;
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" viewBox=\"0 0 {0} {0}\" stroke=\"none\">\n",
        dimension
    );
    result += "\t<rect width=\"100%\" height=\"100%\" fill=\"#FFFFFF\"/>\n";
    result += "\t<path d=\"";
    let mut first = true;
    for (y, row) in grid.rows().enumerate() {
        for (x, &dark) in row.iter().enumerate() {
            if dark {
                if !first {
                    result += " ";
                }
                first = false;
                result += &format!("M{},{}h1v1h-1z", x + border, y + border);
            }
        }
    }
    result += "\" fill=\"#000000\"/>\n";
    result += "</svg>\n";
    result
}

/// Draws the grid with block characters, two per module, surrounded by `border` light modules.
pub fn to_ascii_string(grid: &ModuleGrid, border: u32) -> String {
    let border = border as i32;
    let size = grid.size() as i32;
    let mut result = String::new();
    for y in -border..size + border {
        for x in -border..size + border {
            let c = if grid.get_module(x, y) { '█' } else { ' ' };
            result.push(c);
            result.push(c);
        }
        result.push('\n');
    }
    result
}

/// Generates an SVG document for `content` in the given variant.
///
/// # Example
///
/// ```
/// use qrpattern::helper::generate_svg_string;
/// use qrpattern::matrix::Variant;
///
/// let svg = generate_svg_string("Hello, World!", Variant::Standard);
/// assert!(svg.contains("viewBox=\"0 0 33 33\""));
/// ```
pub fn generate_svg_string(content: &str, variant: Variant) -> String {
    let grid = ModuleGrid::build(content, variant);
    to_svg_string(&grid, 4)
}

// Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{FillStrategy, Placement};

    #[test]
    fn test_to_svg_string() {
        let grid = ModuleGrid::build("HELLO WORLD", Variant::Standard);
        let svg = to_svg_string(&grid, 4);

        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(svg.contains("M4,4h1v1h-1z"));
        assert_eq!(svg.matches("h1v1h-1z").count(), grid.dark_count());
    }

    #[test]
    fn test_to_ascii_string() {
        let grid = ModuleGrid::build("HELLO WORLD", Variant::Enhanced);
        let text = to_ascii_string(&grid, 1);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 23);
        assert!(lines.iter().all(|l| l.chars().count() == 46));
        assert_eq!(lines[1].chars().nth(2), Some('█'));
        assert_eq!(lines[0].trim(), "");
    }

    #[test]
    fn test_generate_default_options() {
        let rendered = generate("Hello, world!", &GenerateOptions::default()).unwrap();
        assert_eq!(rendered.bitmap.dimensions(), (200, 200));
        assert!(!rendered.is_fallback());
    }

    #[test]
    fn test_generate_rejects_zero_size() {
        let options = GenerateOptions::new(0, Variant::Enhanced);
        assert!(matches!(
            generate("x", &options),
            Err(Error::InvalidPixelSize(0))
        ));
    }

    #[test]
    fn test_fallback_on_malformed_grid() {
        let generation = Generation::new("x", GridSpec::new(5, FillStrategy::RollingHashWalk, Placement::Stretched));
        assert!(generation.is_fallback());
        let rendered = generation.render(150, Some("AO")).unwrap();
        assert!(rendered.is_fallback());
        assert_eq!(rendered.bitmap.dimensions(), (150, 150));
        assert_eq!(rendered.bitmap, render::render_fallback(150).unwrap());
    }

    #[test]
    fn test_generate_with_logo() {
        let plain = generate("logo", &GenerateOptions::new(300, Variant::Enhanced)).unwrap();
        let options = GenerateOptions::new(300, Variant::Enhanced).with_default_logo();
        assert_eq!(options.logo_label.as_deref(), Some("AO"));
        let logo = generate("logo", &options).unwrap();
        assert_eq!(plain.grid, logo.grid);
        assert_ne!(plain.bitmap, logo.bitmap);
    }

    #[test]
    fn test_encode_png() {
        let rendered = generate("png", &GenerateOptions::new(64, Variant::Standard)).unwrap();
        let bytes = encode_png(&rendered.bitmap).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap().to_luma8();
        assert_eq!(decoded, rendered.bitmap);
    }

    #[test]
    fn test_meeting_payload() {
        let payload = meeting_payload("Standup", "2025-02-03", "10:30", -33.5, 151.25, "meeting_7");
        assert_eq!(payload, "Standup|2025-02-03|10:30|-33.5,151.25|meeting_7");
    }
}
