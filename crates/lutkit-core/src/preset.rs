//! LUT presets.
//!
//! A [`Preset`] describes the shape and metadata of one exported LUT:
//! its kind (1D, 2D or 3D), file extension, input and output ranges,
//! grid resolution and the free-text fields written into the header.
//!
//! Presets come either from a backend's default factory or from a
//! [`PresetFields`] source, in which every key is optional and missing keys
//! fall back to the backend default.
//!
//! # Example
//!
//! ```rust
//! use lutkit_core::{LutType, Preset, ValueRange};
//!
//! let preset = Preset::new(LutType::Lut3D, ".cc")
//!     .with_cube_size(17)
//!     .with_out_range(ValueRange::float(0.0, 1.0));
//! assert_eq!(preset.grid_len(), Some(17 * 17 * 17));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{LutError, LutResult};

/// Kind of LUT a preset describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LutType {
    /// Single curve shared by all channels.
    #[serde(rename = "1D")]
    Lut1D,
    /// One curve per channel.
    #[serde(rename = "2D")]
    Lut2D,
    /// Full RGB cube.
    #[serde(rename = "3D")]
    Lut3D,
}

impl LutType {
    /// All LUT kinds.
    pub const ALL: [LutType; 3] = [LutType::Lut1D, LutType::Lut2D, LutType::Lut3D];

    /// Short name as used in presets ("1D", "2D", "3D").
    pub fn as_str(self) -> &'static str {
        match self {
            LutType::Lut1D => "1D",
            LutType::Lut2D => "2D",
            LutType::Lut3D => "3D",
        }
    }
}

impl fmt::Display for LutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LutType {
    type Err = LutError;

    fn from_str(s: &str) -> LutResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1D" => Ok(LutType::Lut1D),
            "2D" => Ok(LutType::Lut2D),
            "3D" => Ok(LutType::Lut3D),
            other => Err(LutError::Preset(format!("unknown LUT type '{}'", other))),
        }
    }
}

/// One end of a [`ValueRange`].
///
/// Integer and real bounds are kept apart: `[0, 1023]` declares an
/// integer-coded range while `[0.0, 1.0]` declares a real one, and some
/// formats accept only one of the two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeBound {
    /// Integer-coded bound.
    Int(i64),
    /// Real bound.
    Float(f64),
}

impl RangeBound {
    /// Numeric value of the bound.
    #[inline]
    pub fn value(self) -> f64 {
        match self {
            RangeBound::Int(v) => v as f64,
            RangeBound::Float(v) => v,
        }
    }

    /// Returns true for a real bound.
    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, RangeBound::Float(_))
    }
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeBound::Int(v) => write!(f, "{}", v),
            // Debug keeps the trailing ".0" so 1.0 never reads as an integer
            RangeBound::Float(v) => write!(f, "{:?}", v),
        }
    }
}

/// Ordered `[min, max]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange(pub RangeBound, pub RangeBound);

impl ValueRange {
    /// Real range.
    pub fn float(min: f64, max: f64) -> Self {
        Self(RangeBound::Float(min), RangeBound::Float(max))
    }

    /// Integer-coded range.
    pub fn int(min: i64, max: i64) -> Self {
        Self(RangeBound::Int(min), RangeBound::Int(max))
    }

    /// Lower bound value.
    #[inline]
    pub fn min(&self) -> f64 {
        self.0.value()
    }

    /// Upper bound value.
    #[inline]
    pub fn max(&self) -> f64 {
        self.1.value()
    }

    /// True if both bounds are real numbers.
    pub fn is_float(&self) -> bool {
        self.0.is_float() && self.1.is_float()
    }

    /// True if both bounds are integers.
    pub fn is_int(&self) -> bool {
        !self.0.is_float() && !self.1.is_float()
    }

    /// True if both bounds are finite and `min < max`.
    pub fn is_ordered(&self) -> bool {
        let (min, max) = (self.min(), self.max());
        min.is_finite() && max.is_finite() && min < max
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.0, self.1)
    }
}

/// Preset validation severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Unsupported values are errors.
    #[default]
    Strict,
    /// Unsupported values are replaced by the backend default.
    Lenient,
}

/// LUT export preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// LUT kind
    #[serde(rename = "type")]
    pub lut_type: LutType,
    /// File extension, including the leading dot
    pub ext: String,
    /// Input range sampled on every axis
    pub in_range: ValueRange,
    /// Declared output range
    pub out_range: ValueRange,
    /// Points per axis for 3D, point count for 1D/2D
    pub cube_size: usize,
    /// LUT title
    pub title: String,
    /// Free-text comment
    pub comment: String,
    /// Format version tag
    pub version: String,
}

impl Preset {
    /// Creates a preset with unit ranges, size 33 and empty metadata.
    pub fn new(lut_type: LutType, ext: impl Into<String>) -> Self {
        Self {
            lut_type,
            ext: ext.into(),
            in_range: ValueRange::float(0.0, 1.0),
            out_range: ValueRange::float(0.0, 1.0),
            cube_size: 33,
            title: String::new(),
            comment: String::new(),
            version: String::new(),
        }
    }

    /// Sets the LUT kind.
    pub fn with_type(mut self, lut_type: LutType) -> Self {
        self.lut_type = lut_type;
        self
    }

    /// Sets the grid resolution.
    pub fn with_cube_size(mut self, cube_size: usize) -> Self {
        self.cube_size = cube_size;
        self
    }

    /// Sets the input range.
    pub fn with_in_range(mut self, range: ValueRange) -> Self {
        self.in_range = range;
        self
    }

    /// Sets the output range.
    pub fn with_out_range(mut self, range: ValueRange) -> Self {
        self.out_range = range;
        self
    }

    /// Sets title and comment.
    pub fn with_metadata(mut self, title: impl Into<String>, comment: impl Into<String>) -> Self {
        self.title = title.into();
        self.comment = comment.into();
        self
    }

    /// Sets the version tag.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Number of grid nodes the preset produces, `None` if it overflows.
    pub fn grid_len(&self) -> Option<usize> {
        match self.lut_type {
            LutType::Lut3D => self.cube_size.checked_pow(3),
            LutType::Lut1D | LutType::Lut2D => Some(self.cube_size),
        }
    }
}

/// Partial preset as supplied by a preset source.
///
/// Every field is optional; unknown keys are ignored when deserializing.
/// `type` is kept as a string so that an unknown kind is rejected (or
/// replaced) by validation instead of failing the parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetFields {
    /// LUT kind as written by the source ("1D", "2D", "3D")
    #[serde(rename = "type")]
    pub lut_type: Option<String>,
    /// File extension
    pub ext: Option<String>,
    /// Input range
    pub in_range: Option<ValueRange>,
    /// Output range
    pub out_range: Option<ValueRange>,
    /// Grid resolution
    pub cube_size: Option<usize>,
    /// LUT title
    pub title: Option<String>,
    /// Free-text comment
    pub comment: Option<String>,
    /// Format version tag
    pub version: Option<String>,
}

impl PresetFields {
    /// Parses preset fields from a YAML mapping.
    ///
    /// ```rust
    /// use lutkit_core::PresetFields;
    ///
    /// let fields = PresetFields::from_yaml("type: 3D\ncube_size: 17\nvendor: acme\n").unwrap();
    /// assert_eq!(fields.cube_size, Some(17));
    /// ```
    pub fn from_yaml(text: &str) -> LutResult<Self> {
        serde_yaml::from_str(text).map_err(|e| LutError::Preset(e.to_string()))
    }

    /// Parses preset fields from a YAML mapping one key at a time.
    ///
    /// In strict mode this behaves like [`from_yaml`](Self::from_yaml). In
    /// lenient mode a key whose value has the wrong shape (`cube_size: -1`,
    /// `in_range: [1.0]`) is dropped so that resolution falls back to the
    /// backend default. The document itself must still be a mapping.
    ///
    /// ```rust
    /// use lutkit_core::{PresetFields, ValidationMode};
    ///
    /// let fields = PresetFields::from_yaml_with("cube_size: -1\ntitle: Look\n", ValidationMode::Lenient).unwrap();
    /// assert_eq!(fields.cube_size, None);
    /// assert_eq!(fields.title.as_deref(), Some("Look"));
    /// ```
    pub fn from_yaml_with(text: &str, mode: ValidationMode) -> LutResult<Self> {
        let doc: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| LutError::Preset(e.to_string()))?;
        match doc {
            serde_yaml::Value::Null => return Ok(Self::default()),
            serde_yaml::Value::Mapping(_) => {}
            _ => return Err(LutError::Preset("preset source is not a mapping".into())),
        }

        Ok(Self {
            lut_type: source_field(&doc, "type", mode)?,
            ext: source_field(&doc, "ext", mode)?,
            in_range: source_field(&doc, "in_range", mode)?,
            out_range: source_field(&doc, "out_range", mode)?,
            cube_size: source_field(&doc, "cube_size", mode)?,
            title: source_field(&doc, "title", mode)?,
            comment: source_field(&doc, "comment", mode)?,
            version: source_field(&doc, "version", mode)?,
        })
    }

    /// Fills missing fields from `default` and parses the LUT type.
    ///
    /// An unrecognized `type` is a validation error in strict mode and is
    /// replaced by the default type in lenient mode.
    pub fn resolve(self, format: &'static str, default: &Preset, mode: ValidationMode) -> LutResult<Preset> {
        let lut_type = match self.lut_type {
            None => default.lut_type,
            Some(raw) => match raw.parse::<LutType>() {
                Ok(t) => t,
                Err(_) if mode == ValidationMode::Lenient => default.lut_type,
                Err(_) => {
                    return Err(LutError::Validation {
                        format,
                        field: "type",
                        value: raw,
                        allowed: join_types(&LutType::ALL),
                    });
                }
            },
        };

        Ok(Preset {
            lut_type,
            ext: self.ext.unwrap_or_else(|| default.ext.clone()),
            in_range: self.in_range.unwrap_or(default.in_range),
            out_range: self.out_range.unwrap_or(default.out_range),
            cube_size: self.cube_size.unwrap_or(default.cube_size),
            title: self.title.unwrap_or_else(|| default.title.clone()),
            comment: self.comment.unwrap_or_else(|| default.comment.clone()),
            version: self.version.unwrap_or_else(|| default.version.clone()),
        })
    }
}

impl From<&Preset> for PresetFields {
    fn from(preset: &Preset) -> Self {
        Self {
            lut_type: Some(preset.lut_type.to_string()),
            ext: Some(preset.ext.clone()),
            in_range: Some(preset.in_range),
            out_range: Some(preset.out_range),
            cube_size: Some(preset.cube_size),
            title: Some(preset.title.clone()),
            comment: Some(preset.comment.clone()),
            version: Some(preset.version.clone()),
        }
    }
}

fn source_field<T: DeserializeOwned>(doc: &serde_yaml::Value, key: &'static str, mode: ValidationMode) -> LutResult<Option<T>> {
    let raw = match doc.get(key) {
        Some(raw) if !raw.is_null() => raw,
        _ => return Ok(None),
    };
    match serde_yaml::from_value(raw.clone()) {
        Ok(value) => Ok(Some(value)),
        Err(e) if mode == ValidationMode::Lenient => {
            tracing::debug!(field = key, error = %e, "malformed preset field ignored");
            Ok(None)
        }
        Err(e) => Err(LutError::Preset(format!("invalid '{}': {}", key, e))),
    }
}

/// Formats a list of types as `'1D', '3D'`.
pub fn join_types(types: &[LutType]) -> String {
    types
        .iter()
        .map(|t| format!("'{}'", t))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Applies one validation rule: in strict mode a failed rule is an error,
/// in lenient mode the field takes the default value.
///
/// Backends use it for their own rules in
/// [`LutFormat::validate_specific`](crate::LutFormat::validate_specific).
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// Backend name used in errors
    pub format: &'static str,
    /// Strict or lenient
    pub mode: ValidationMode,
}

impl FieldRule {
    /// Checks one field. `valid` is the outcome of the rule, `allowed`
    /// describes accepted values for the error message.
    pub fn enforce<T: Clone + fmt::Display>(
        &self,
        field: &'static str,
        value: &mut T,
        default: &T,
        valid: bool,
        allowed: impl Into<String>,
    ) -> LutResult<()> {
        if valid {
            return Ok(());
        }
        match self.mode {
            ValidationMode::Strict => Err(LutError::Validation {
                format: self.format,
                field,
                value: value.to_string(),
                allowed: allowed.into(),
            }),
            ValidationMode::Lenient => {
                tracing::debug!(field, from = %value, to = %default, "preset field replaced by default");
                *value = default.clone();
                Ok(())
            }
        }
    }
}

/// Checks the constraints every backend shares.
///
/// Extension must start with a dot, both ranges must be finite and ordered
/// and the grid must have at least one point with a node count that fits
/// in `usize`.
pub fn validate_common(
    format: &'static str,
    mut preset: Preset,
    default: &Preset,
    mode: ValidationMode,
) -> LutResult<Preset> {
    let rule = FieldRule { format, mode };

    let ext_ok = preset.ext.len() > 1 && preset.ext.starts_with('.');
    rule.enforce("ext", &mut preset.ext, &default.ext, ext_ok, "an extension such as '.cube'")?;

    let in_ok = preset.in_range.is_ordered();
    rule.enforce("in_range", &mut preset.in_range, &default.in_range, in_ok, "an ordered [min, max] pair")?;

    let out_ok = preset.out_range.is_ordered();
    rule.enforce("out_range", &mut preset.out_range, &default.out_range, out_ok, "an ordered [min, max] pair")?;

    let size_ok = preset.cube_size >= 1 && preset.grid_len().is_some();
    rule.enforce("cube_size", &mut preset.cube_size, &default.cube_size, size_ok, "a size >= 1")?;

    Ok(preset)
}
