#![forbid(unsafe_code)]
//! Data fill for module grids.
//!
//! Every cell the [`ReservationMask`] marks as data receives a bit derived from a rolling
//! hash of the input text. The hash is a pure function of the text, so the same text always
//! produces the same fill. Two strategies exist and a grid uses exactly one of them, as
//! recorded in its [`GridSpec`](crate::matrix::GridSpec).
use crate::matrix::{FillStrategy, ModuleGrid, ReservationMask};

const LCG_MULTIPLIER: u32 = 1_103_515_245;
const LCG_INCREMENT: u32 = 12_345;
const LCG_MODULUS_MASK: u32 = 0x7fff_ffff;

/// Percentage of data cells the linear-congruential walk aims to darken.
pub const TARGET_FILL_PERCENT: u32 = 45;

/// Order-dependent 32-bit digest of a text.
///
/// The text is read as UTF-16 code units and folded with `acc * 31 + unit` under 32-bit
/// wrapping arithmetic.
///
/// # Example
///
/// ```rust
/// use qrpattern::encoder::RollingHash;
///
/// assert_eq!(RollingHash::of("TEST").value(), 2_571_410);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RollingHash(i32);

impl RollingHash {
    pub fn of(text: &str) -> Self {
        let raw = text
            .encode_utf16()
            .fold(0i32, |acc, unit| {
                (acc << 5).wrapping_sub(acc).wrapping_add(i32::from(unit))
            });
        Self(raw.wrapping_abs())
    }

    /// Returns the non-negative digest, except for `i32::MIN` which has no positive twin.
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Returns bit `index` of the digest, wrapping the index modulo 32.
    pub const fn bit(self, index: usize) -> bool {
        get_bit(self.0, index)
    }
}

/// Fills the data cells of `grid` from `text` using the grid's own strategy.
pub fn encode(grid: &mut ModuleGrid, text: &str) {
    let size = grid.size();
    match ReservationMask::cached(size) {
        Some(mask) => encode_with_mask(grid, mask, text),
        None => encode_with_mask(grid, &ReservationMask::new(size), text),
    }
}

pub(crate) fn encode_with_mask(grid: &mut ModuleGrid, mask: &ReservationMask, text: &str) {
    assert_eq!(grid.size(), mask.size(), "Mask does not match grid");
    let hash = RollingHash::of(text);
    match grid.spec().strategy() {
        FillStrategy::RollingHashWalk => fill_rolling_walk(grid, mask, hash),
        FillStrategy::LinearCongruential => fill_lcg_walk(grid, mask, hash),
    }
}

/// Returns the data cells in the order the rolling-hash walk visits them, as `(x, y)`.
///
/// Columns are taken in pairs from the right edge, stepping over the timing column. Rows
/// run upward in pairs whose right column satisfies `col % 4 < 2`, downward otherwise.
pub fn zigzag_order(mask: &ReservationMask) -> Vec<(usize, usize)> {
    let size = mask.size() as i32;
    let mut cells = Vec::with_capacity(mask.fillable_count());
    let mut right: i32 = size - 1;
    while right >= 1 {
        if right == 6 {
            right = 5;
        }
        let upward = right % 4 < 2;
        for vert in 0..size {
            let y = if upward { size - 1 - vert } else { vert };
            for j in 0..2 {
                let x = right - j;
                if mask.is_fillable(x as usize, y as usize) {
                    cells.push((x as usize, y as usize));
                }
            }
        }
        right -= 2;
    }
    cells
}

fn fill_rolling_walk(grid: &mut ModuleGrid, mask: &ReservationMask, hash: RollingHash) {
    for (i, (x, y)) in zigzag_order(mask).into_iter().enumerate() {
        grid.set_module_bounded(x, y, hash.bit(i));
    }
}

fn fill_lcg_walk(grid: &mut ModuleGrid, mask: &ReservationMask, hash: RollingHash) {
    let mut seed = Lcg::new(hash);
    let size = grid.size();
    for y in 0..size {
        for x in 0..size {
            if mask.is_fillable(x, y) {
                grid.set_module_bounded(x, y, seed.next_value() % 100 < TARGET_FILL_PERCENT);
            }
        }
    }
}

/// Linear-congruential generator over 31-bit state, local to one fill.
#[derive(Clone, Copy, Debug)]
struct Lcg(u32);

impl Lcg {
    fn new(hash: RollingHash) -> Self {
        Self(hash.value() as u32)
    }

    fn next_value(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(LCG_MULTIPLIER).wrapping_add(LCG_INCREMENT) & LCG_MODULUS_MASK;
        self.0
    }
}

const fn get_bit(x: i32, i: usize) -> bool {
    ((x >> (i % 32)) & 1) != 0
}
