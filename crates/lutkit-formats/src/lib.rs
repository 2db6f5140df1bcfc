//! # lutkit-formats
//!
//! LUT file format backends.
//!
//! Each backend implements [`LutFormat`](lutkit_core::LutFormat) and only
//! describes its file layout; sampling, validation and writing come from
//! [`LutExporter`](lutkit_core::LutExporter).
//!
//! # Supported Formats
//!
//! - `.cc` - Christophe Lorenz Colour Cube ([`clcc`] module), 3D only
//! - `.cube` - Adobe/Resolve cube ([`cube`] module), 1D/2D and 3D
//!
//! # Usage
//!
//! ```rust,no_run
//! use lutkit_core::{LutExporter, LutFormat};
//! use lutkit_formats::ColourCube;
//!
//! let preset = ColourCube.default_preset().with_cube_size(17);
//! LutExporter::new(&ColourCube)
//!     .write_3d_lut(&|rgb: [f64; 3]| rgb, "identity.cc".as_ref(), &preset)
//!     .unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod clcc;
pub mod cube;
mod registry;

pub use clcc::{parse_cc, ColourCube};
pub use cube::{parse_cube, ResolveCube};
pub use registry::FormatRegistry;

use lutkit_core::{LutType, ValueRange};

/// A LUT file read back from disk, data in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLut {
    /// Kind of table found in the file
    pub lut_type: LutType,
    /// Points per axis (3D) or point count (curves)
    pub size: usize,
    /// Title, if the format stores one
    pub title: Option<String>,
    /// Input domain, if declared
    pub domain: Option<ValueRange>,
    /// Output triples
    pub data: Vec<[f64; 3]>,
}
