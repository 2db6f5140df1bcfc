//! # lutkit-core
//!
//! Shared machinery for exporting color transforms as LUT files.
//!
//! A color transform is sampled over a regular grid and serialized by a
//! format backend. Everything that must behave the same for every format
//! lives here: presets and their validation, grid sampling, the output
//! range check, the export driver and the notification channel.
//!
//! # Pipeline
//!
//! ```text
//! Preset -> validate -> sample -> check output range -> header + data lines -> file
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use lutkit_core::{LutExporter, LutFormat, ValidationMode};
//!
//! let exporter = LutExporter::new(&format).with_mode(ValidationMode::Lenient);
//! exporter.write_lut(&|rgb: [f64; 3]| [rgb[0].powf(2.2), rgb[1].powf(2.2), rgb[2].powf(2.2)],
//!                    "gamma.cube".as_ref(), &format.default_preset())?;
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - Error handling
//! - [`tracing`] - Diagnostics and the default notifier
//! - [`rayon`] - Optional parallel sampling
//! - [`chrono`] - Header timestamps
//! - [`tempfile`] - Atomic file replacement
//!
//! # Used By
//!
//! - `lutkit-formats` - Format backends

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod export;
mod format;
mod notify;
mod preset;
mod range;
mod sampler;

pub use error::{LutError, LutResult};
pub use export::LutExporter;
pub use format::{
    format_timestamp, validate_capabilities, validate_preset, FormatCapabilities, LutFormat, MAX_CUBE_SIZE,
    MAX_CURVE_SIZE,
};
pub use notify::{MemoryNotifier, Notification, Notifier, TracingNotifier};
pub use preset::{
    join_types, validate_common, FieldRule, LutType, Preset, PresetFields, RangeBound, ValidationMode, ValueRange,
};
pub use range::{RangePolicy, RangeSeverity};
pub use sampler::{axis_values, ColorTransform, GridOrder, SampleGrid, Sampler};

/// Re-exported so backends can name header timestamps without a direct dependency.
pub use chrono::{DateTime, Local, TimeZone};
