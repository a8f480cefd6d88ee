//! Pipeline stages for PDF-to-image conversion.
//!
//! Each submodule implements exactly one step; [`crate::convert`] sequences
//! them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ layout ──▶ probe ──▶ page ──▶ page ──▶ …
//! (validate) (out dir)  (identify) (convert, strictly in page order)
//! ```
//!
//! 1. [`input`]: extension and existence checks
//! 2. [`layout`]: output directory and file names; creates the directory
//! 3. [`probe`]: page count via the rasterizer's identify capability,
//!    optionally under a time budget
//! 4. [`page`]: one rasterizer convert call per page, then a size check
//!
//! [`magick`] holds the [`magick::Rasterizer`] seam and its GraphicsMagick
//! implementation.

pub mod input;
pub mod layout;
pub mod magick;
pub mod page;
pub mod probe;
