//! Format backend interface.
//!
//! A backend describes one LUT file format: which LUT kinds it can hold,
//! how its output range is coded, its node order, its default preset and
//! how its header and data lines look. Sampling, validation, range checks
//! and file writing are shared and live in [`LutExporter`](crate::LutExporter).
//!
//! # Example
//!
//! ```rust,ignore
//! struct Itx;
//!
//! impl LutFormat for Itx {
//!     fn name(&self) -> &'static str { "Iridas ITX" }
//!     fn extensions(&self) -> &'static [&'static str] { &["itx"] }
//!     fn capabilities(&self) -> FormatCapabilities { FormatCapabilities::float_3d() }
//!     fn default_preset(&self) -> Preset { Preset::new(LutType::Lut3D, ".itx") }
//!     fn header(&self, preset: &Preset, _: &DateTime<Local>) -> String {
//!         format!("LUT_3D_SIZE {}\n", preset.cube_size)
//!     }
//!     fn data_line(&self, rgb: [f64; 3]) -> String {
//!         format!("{:.6} {:.6} {:.6}\n", rgb[0], rgb[1], rgb[2])
//!     }
//! }
//! ```

use std::path::Path;

use chrono::{DateTime, Local};

use crate::preset::{join_types, validate_common};
use crate::{
    FieldRule, GridOrder, LutResult, LutType, Preset, RangePolicy, RangeSeverity, ValidationMode, ValueRange,
};

/// Default upper bound on 3D points per axis.
pub const MAX_CUBE_SIZE: usize = 256;

/// Default upper bound on 1D/2D curve length.
pub const MAX_CURVE_SIZE: usize = 65536;

/// What a backend can store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatCapabilities {
    /// Supported LUT kinds
    pub lut_types: &'static [LutType],
    /// Numeric domain of the stored samples
    pub range_policy: RangePolicy,
    /// Reaction to an `out_range` outside `range_policy`
    pub range_severity: RangeSeverity,
    /// Order of 3D data lines
    pub grid_order: GridOrder,
    /// Largest 3D points per axis
    pub max_cube_size: usize,
    /// Largest 1D/2D curve length
    pub max_curve_size: usize,
}

impl FormatCapabilities {
    /// 3D-only float format, red-fastest, strict range policy.
    pub const fn float_3d() -> Self {
        Self {
            lut_types: &[LutType::Lut3D],
            range_policy: RangePolicy::FloatOnly,
            range_severity: RangeSeverity::Error,
            grid_order: GridOrder::RedFastest,
            max_cube_size: MAX_CUBE_SIZE,
            max_curve_size: MAX_CURVE_SIZE,
        }
    }

    /// Largest `cube_size` accepted for `lut_type`.
    pub fn max_size(&self, lut_type: LutType) -> usize {
        match lut_type {
            LutType::Lut3D => self.max_cube_size,
            LutType::Lut1D | LutType::Lut2D => self.max_curve_size,
        }
    }

    /// Returns true if `lut_type` can be written.
    pub fn supports(&self, lut_type: LutType) -> bool {
        self.lut_types.contains(&lut_type)
    }

    /// Returns true if 1D or 2D tables can be written.
    pub fn supports_curves(&self) -> bool {
        self.supports(LutType::Lut1D) || self.supports(LutType::Lut2D)
    }
}

/// A LUT file format backend.
pub trait LutFormat: Send + Sync {
    /// Human-readable format name.
    fn name(&self) -> &'static str;

    /// File extensions without dots.
    fn extensions(&self) -> &'static [&'static str];

    /// What the format can store.
    fn capabilities(&self) -> FormatCapabilities;

    /// Built-in preset. Called on demand; no shared state.
    fn default_preset(&self) -> Preset;

    /// Preamble of a 3D file.
    fn header(&self, preset: &Preset, created: &DateTime<Local>) -> String;

    /// Preamble of a 1D/2D file, `None` when the format has no curve tables.
    fn header_1d(&self, _preset: &Preset, _created: &DateTime<Local>) -> Option<String> {
        None
    }

    /// One data line, newline included.
    fn data_line(&self, rgb: [f64; 3]) -> String;

    /// Message used when `out_range` violates the range policy.
    fn range_message(&self, out_range: &ValueRange) -> String {
        let expected = match self.capabilities().range_policy {
            RangePolicy::FloatOnly => "float. Ex: [0.0, 1.0]",
            RangePolicy::IntegerCoded => "integer. Ex: [0, 1023]",
            RangePolicy::Any => "any numeric range",
        };
        format!("{} output range is expected to be {}.\nYour range {}", self.name(), expected, out_range)
    }

    /// Success message for an export to `path`.
    fn export_message(&self, path: &Path) -> String {
        format!("{} LUT successfully exported in: {}", self.name(), path.display())
    }

    /// Format-specific preset rules, checked before the common ones.
    ///
    /// The default applies [`validate_capabilities`]. Overrides add their
    /// own rules on top of it.
    fn validate_specific(&self, preset: Preset, mode: ValidationMode) -> LutResult<Preset> {
        validate_capabilities(self, preset, mode)
    }
}

/// Checks a preset against the format's capabilities.
///
/// The LUT kind must be one the format stores and `cube_size` must not
/// exceed the format's limit for that kind. Strict mode rejects, lenient
/// mode takes the default preset's value.
pub fn validate_capabilities<F>(format: &F, mut preset: Preset, mode: ValidationMode) -> LutResult<Preset>
where
    F: LutFormat + ?Sized,
{
    let caps = format.capabilities();
    let default = format.default_preset();
    let rule = FieldRule { format: format.name(), mode };

    let type_ok = caps.supports(preset.lut_type);
    rule.enforce("type", &mut preset.lut_type, &default.lut_type, type_ok, join_types(caps.lut_types))?;

    let max = caps.max_size(preset.lut_type);
    let size_ok = preset.cube_size <= max;
    let size_default = default.cube_size.min(max);
    rule.enforce("cube_size", &mut preset.cube_size, &size_default, size_ok, format!("a size <= {}", max))?;

    Ok(preset)
}

/// Validates `preset` for `format`: format rules first, then common rules.
pub fn validate_preset(format: &dyn LutFormat, preset: Preset, mode: ValidationMode) -> LutResult<Preset> {
    let default = format.default_preset();
    let preset = format.validate_specific(preset, mode)?;
    validate_common(format.name(), preset, &default, mode)
}

/// Timestamp layout used in headers: `2024-05-01 14:03:07.123456`.
pub fn format_timestamp(created: &DateTime<Local>) -> String {
    created.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}
