#![forbid(unsafe_code)]
//! Module grid construction.
//!
//! This module owns the square grid of dark and light modules and the structural layout
//! stamped into it: three finder patterns, their separators, the timing tracks along row
//! and column 6, and a fixed format-info decoration. Every cell that is not claimed by a
//! structural region is left to the [`encoder`](crate::encoder).
use core::fmt;
use core::str::FromStr;
use std::sync::OnceLock;

use log::debug;

use crate::encoder;
use crate::error::{BuildError, Error};

/// Fixed format-info decoration stamped next to the top-left finder.
const FORMAT_BITS: [bool; 9] = [true, false, true, false, true, true, false, true, false];

/// Side length of a finder pattern, in modules.
const FINDER_SIZE: usize = 7;

/// The grid variants supported by the generator.
///
/// Each variant fixes the side length, the data fill strategy and the way the grid is
/// placed on the canvas.
///
/// # Example
///
/// ```rust
/// use qrpattern::matrix::Variant;
///
/// let variant: Variant = "enhanced".parse().unwrap();
/// assert_eq!(variant.size(), 21);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Variant {
    /// 25×25 grid filled by the rolling-hash walk, stretched to the canvas.
    #[default]
    Standard,
    /// 21×21 grid filled by the linear-congruential walk, centered on the canvas.
    Enhanced,
}

impl Variant {
    pub const fn size(self) -> usize {
        match self {
            Variant::Standard => 25,
            Variant::Enhanced => 21,
        }
    }

    pub const fn strategy(self) -> FillStrategy {
        match self {
            Variant::Standard => FillStrategy::RollingHashWalk,
            Variant::Enhanced => FillStrategy::LinearCongruential,
        }
    }

    pub const fn placement(self) -> Placement {
        match self {
            Variant::Standard => Placement::Stretched,
            Variant::Enhanced => Placement::Centered,
        }
    }

    /// Returns the grid geometry used by this variant.
    pub const fn spec(self) -> GridSpec {
        GridSpec {
            size: self.size(),
            strategy: self.strategy(),
            placement: self.placement(),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Variant::Standard => "standard",
            Variant::Enhanced => "enhanced",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Variant::Standard),
            "enhanced" => Ok(Variant::Enhanced),
            _ => Err(Error::UnsupportedVariant(s.to_string())),
        }
    }
}

/// How data cells are derived from the text hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum FillStrategy {
    /// Serpentine column-pair walk reading successive bits of the hash.
    RollingHashWalk,
    /// Row-major walk driven by a linear-congruential generator seeded with the hash.
    LinearCongruential,
}

/// How a grid is laid out on a square canvas.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Placement {
    /// Real-valued module size, the grid touches all four canvas edges.
    Stretched,
    /// Whole-pixel module size, the residual margin is split evenly around the grid.
    Centered,
}

/// Side length, fill strategy and canvas placement of a grid.
///
/// The two [`Variant`]s cover the supported geometries. Arbitrary sizes can be requested
/// through [`GridSpec::new`], in which case [`ModuleGrid::try_build`] validates them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GridSpec {
    size: usize,
    strategy: FillStrategy,
    placement: Placement,
}

impl GridSpec {
    /// Smallest side that fits three finder patterns with their separators without overlap.
    pub const MIN_SIZE: usize = 2 * (FINDER_SIZE + 1) + 1;

    /// Largest side accepted, that of a version 40 QR code.
    pub const MAX_SIZE: usize = 177;

    pub const fn new(size: usize, strategy: FillStrategy, placement: Placement) -> Self {
        Self {
            size,
            strategy,
            placement,
        }
    }

    pub const fn size(self) -> usize {
        self.size
    }

    pub const fn strategy(self) -> FillStrategy {
        self.strategy
    }

    pub const fn placement(self) -> Placement {
        self.placement
    }
}

/// Structural classification of a single cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Region {
    Finder,
    Separator,
    Timing,
    FormatInfo,
    Data,
}

impl Region {
    /// Classifies the cell at column `x`, row `y` of a grid with side `size`.
    ///
    /// The result depends on coordinates only, never on grid contents.
    pub fn classify(x: usize, y: usize, size: usize) -> Region {
        let far = size.saturating_sub(FINDER_SIZE);
        let in_corner = |limit: usize| {
            let far = size.saturating_sub(limit);
            (x < limit && y < limit) || (x >= far && y < limit) || (x < limit && y >= far)
        };
        if (x < FINDER_SIZE && y < FINDER_SIZE)
            || (x >= far && y < FINDER_SIZE)
            || (x < FINDER_SIZE && y >= far)
        {
            Region::Finder
        } else if in_corner(FINDER_SIZE + 1) {
            Region::Separator
        } else if x == 6 || y == 6 {
            Region::Timing
        } else if (x < 9 && y < 9)
            || (x >= size.saturating_sub(8) && y < 9)
            || (x < 9 && y >= size.saturating_sub(8))
        {
            Region::FormatInfo
        } else {
            Region::Data
        }
    }

    pub fn is_data(self) -> bool {
        self == Region::Data
    }
}

/// Precomputed [`Region`] of every cell of a grid size.
///
/// Shared by the builder and the encoder so that both agree on which cells are fillable.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ReservationMask {
    size: usize,
    regions: Vec<Region>,
}

impl ReservationMask {
    pub fn new(size: usize) -> Self {
        let mut regions = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                regions.push(Region::classify(x, y, size));
            }
        }
        Self { size, regions }
    }

    /// Returns the process-wide mask for the variant sizes, or `None` for other sizes.
    pub fn cached(size: usize) -> Option<&'static ReservationMask> {
        static STANDARD: OnceLock<ReservationMask> = OnceLock::new();
        static ENHANCED: OnceLock<ReservationMask> = OnceLock::new();
        if size == Variant::Standard.size() {
            Some(STANDARD.get_or_init(|| ReservationMask::new(size)))
        } else if size == Variant::Enhanced.size() {
            Some(ENHANCED.get_or_init(|| ReservationMask::new(size)))
        } else {
            None
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn region(&self, x: usize, y: usize) -> Region {
        assert!(x < self.size && y < self.size, "Cell out of range");
        self.regions[y * self.size + x]
    }

    pub fn is_fillable(&self, x: usize, y: usize) -> bool {
        self.region(x, y).is_data()
    }

    /// Number of cells the encoder may write.
    pub fn fillable_count(&self) -> usize {
        self.regions.iter().filter(|r| r.is_data()).count()
    }
}

/// A square grid of dark (`true`) and light (`false`) modules.
///
/// # Example
///
/// ```rust
/// use qrpattern::matrix::{ModuleGrid, Variant};
///
/// let grid = ModuleGrid::build("Hello, World!", Variant::Standard);
/// assert_eq!(grid.size(), 25);
/// // Outer ring of the top-left finder is dark.
/// assert!(grid.get_module(0, 0));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ModuleGrid {
    spec: GridSpec,
    modules: Vec<bool>,
}

impl ModuleGrid {
    /// Builds and encodes the grid of a supported variant.
    ///
    /// Total over every input text, including the empty string.
    pub fn build(text: &str, variant: Variant) -> Self {
        Self::construct(text, variant.spec())
    }

    /// Builds and encodes a grid with arbitrary geometry.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::GridTooSmall`] if the side cannot hold the structural layout and
    /// [`BuildError::GridTooLarge`] if it exceeds [`GridSpec::MAX_SIZE`].
    pub fn try_build(text: &str, spec: GridSpec) -> Result<Self, BuildError> {
        if spec.size < GridSpec::MIN_SIZE {
            return Err(BuildError::GridTooSmall {
                size: spec.size,
                min: GridSpec::MIN_SIZE,
            });
        }
        if spec.size > GridSpec::MAX_SIZE {
            return Err(BuildError::GridTooLarge {
                size: spec.size,
                max: GridSpec::MAX_SIZE,
            });
        }
        Ok(Self::construct(text, spec))
    }

    fn construct(text: &str, spec: GridSpec) -> Self {
        let local;
        let mask = match ReservationMask::cached(spec.size) {
            Some(mask) => mask,
            None => {
                local = ReservationMask::new(spec.size);
                &local
            }
        };
        let mut grid = Self::structural(spec);
        encoder::encode_with_mask(&mut grid, mask, text);
        debug!(
            "built {}x{} grid ({:?}), {} dark modules",
            spec.size,
            spec.size,
            spec.strategy,
            grid.dark_count()
        );
        grid
    }

    /// Allocates a light grid and stamps every structural region, leaving data cells light.
    pub(crate) fn structural(spec: GridSpec) -> Self {
        let mut grid = Self {
            spec,
            modules: vec![false; spec.size * spec.size],
        };
        let far = spec.size - FINDER_SIZE;
        grid.draw_finder(0, 0);
        grid.draw_finder(far, 0);
        grid.draw_finder(0, far);
        grid.draw_separators();
        grid.draw_timing();
        grid.draw_format_bits();
        grid
    }

    pub fn size(&self) -> usize {
        self.spec.size
    }

    pub fn spec(&self) -> GridSpec {
        self.spec
    }

    /// Returns the color of the module at column `x`, row `y`.
    ///
    /// Coordinates outside the grid return `false`.
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        let range = 0..self.size() as i32;
        range.contains(&x) && range.contains(&y) && self.get_module_bounded(x as usize, y as usize)
    }

    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|&&m| m).count()
    }

    /// Iterates rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.modules.chunks(self.spec.size)
    }

    pub(crate) fn get_module_bounded(&self, x: usize, y: usize) -> bool {
        assert!(x < self.size() && y < self.size(), "Cell out of range");
        self.modules[y * self.size() + x]
    }

    pub(crate) fn set_module_bounded(&mut self, x: usize, y: usize, isdark: bool) {
        assert!(x < self.size() && y < self.size(), "Cell out of range");
        let size = self.size();
        self.modules[y * size + x] = isdark;
    }

    // Dark outer ring, light ring, dark 3x3 core.
    fn draw_finder(&mut self, left: usize, top: usize) {
        for dy in 0..FINDER_SIZE {
            for dx in 0..FINDER_SIZE {
                let dist = (dx as i32 - 3).abs().max((dy as i32 - 3).abs());
                self.set_module_bounded(left + dx, top + dy, dist != 2);
            }
        }
    }

    fn draw_separators(&mut self) {
        let size = self.size();
        for i in 0..=FINDER_SIZE {
            // Top-left
            self.set_module_bounded(i, 7, false);
            self.set_module_bounded(7, i, false);
            // Top-right
            self.set_module_bounded(size - 8 + i, 7, false);
            self.set_module_bounded(size - 8, i, false);
            // Bottom-left
            self.set_module_bounded(i, size - 8, false);
            self.set_module_bounded(7, size - 8 + i, false);
        }
    }

    fn draw_timing(&mut self) {
        for i in 8..self.size() - 8 {
            self.set_module_bounded(i, 6, i % 2 == 0);
            self.set_module_bounded(6, i, i % 2 == 0);
        }
    }

    fn draw_format_bits(&mut self) {
        for (i, &bit) in FORMAT_BITS.iter().enumerate() {
            match i {
                0..=5 => self.set_module_bounded(i, 8, bit),
                6 | 7 => self.set_module_bounded(i + 1, 8, bit),
                _ => self.set_module_bounded(8, 7, bit),
            }
        }
    }
}
