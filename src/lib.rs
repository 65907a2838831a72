//! # qrpattern
//!
//! A Rust library for turning text into QR-style module matrices and bitmaps.
//!
//! `qrpattern` builds a square grid with the familiar structure of a scanning code (three
//! finder patterns, separators, timing tracks and a format-info strip) and fills the rest
//! from a rolling hash of the input text. The output is reproducible: the same text always
//! yields the same grid and the same bitmap. It is not a standards-conformant QR encoder and
//! carries no error correction, so third-party scanners will not decode it.
//!
//! ## Features
//!
//! - Two variants: a 25×25 `standard` grid and a 21×21 `enhanced` grid.
//! - Render to in-memory grayscale image buffers at any pixel size.
//! - Optional logo overlay with a short text label.
//! - A fixed fallback pattern, so generation always produces a bitmap.
//! - SVG, ASCII and PNG output helpers.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qrpattern = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Generate a meeting code with a logo and export it as PNG:
//!
//! ```rust
//! use qrpattern::helper::{encode_png, generate, meeting_payload, GenerateOptions};
//! use qrpattern::matrix::Variant;
//!
//! fn main() -> qrpattern::Result<()> {
//!     let payload = meeting_payload("Meeting", "2025-01-01", "09:00", 28.7041, 77.1025, "meeting_1");
//!     let options = GenerateOptions::new(300, Variant::Enhanced).with_logo("AO");
//!     let rendered = generate(&payload, &options)?;
//!     let png = encode_png(&rendered.bitmap)?;
//!     assert!(!png.is_empty());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`matrix`]: Grid construction and structural layout.
//! - [`encoder`]: Hash-driven data fill.
//! - [`render`]: Rasterization, fallback pattern and logo overlay.
//! - [`helper`]: One-call generation and output formats.

#![forbid(unsafe_code)]

pub mod encoder;
pub mod error;
mod font;
pub mod helper;
pub mod matrix;
pub mod render;

pub use error::{BuildError, Error, Result};
pub use helper::{generate, GenerateOptions, Generation, Rendered};
pub use matrix::{ModuleGrid, Variant};
pub use render::Bitmap;
