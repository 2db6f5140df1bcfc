//! Adobe/Resolve .cube LUT format support.
//!
//! The .cube format is a simple text-based LUT format widely supported
//! by DaVinci Resolve, Adobe applications, and many other tools. It holds
//! either a 3D cube or a set of three 1D curves.
//!
//! # Format
//!
//! ```text
//! # Comment
//! # Created 2024-05-01 14:03:07.123456
//! TITLE "LUT Name"
//! LUT_3D_SIZE 33
//! DOMAIN_MIN 0.000000 0.000000 0.000000
//! DOMAIN_MAX 1.000000 1.000000 1.000000
//!
//! 0.000000 0.000000 0.000000
//! ...
//! 1.000000 1.000000 1.000000
//! ```
//!
//! - 3D data: red changes fastest, then green, then blue
//! - 1D data: one line per input step, columns are R, G, B
//! - An integer-coded `out_range` is accepted with a warning, samples are
//!   still written as real numbers
//!
//! # Example
//!
//! ```rust,ignore
//! use lutkit_core::LutExporter;
//! use lutkit_formats::ResolveCube;
//!
//! let exporter = LutExporter::new(&ResolveCube);
//! exporter.write_lut(&grade, "grade.cube".as_ref(), &ResolveCube.default_preset())?;
//! ```

use std::io::BufRead;

use lutkit_core::{
    format_timestamp, DateTime, FormatCapabilities, GridOrder, Local, LutError, LutFormat, LutResult, LutType,
    Preset, RangePolicy, RangeSeverity, ValueRange, MAX_CUBE_SIZE, MAX_CURVE_SIZE,
};

use crate::ParsedLut;

/// Resolve/Adobe .cube backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveCube;

impl ResolveCube {
    fn preamble(&self, preset: &Preset, created: &DateTime<Local>, size_key: &str) -> String {
        let mut out = String::new();
        for line in preset.comment.lines() {
            out.push_str(&format!("# {}\n", line));
        }
        out.push_str(&format!("# Created {}\n", format_timestamp(created)));
        // Quotes delimit the title, which must stay on one line
        let title = preset.title.replace('"', "'").replace(['\r', '\n'], " ");
        out.push_str(&format!("TITLE \"{}\"\n", title));
        out.push_str(&format!("{} {}\n", size_key, preset.cube_size));

        let (min, max) = (preset.in_range.min(), preset.in_range.max());
        if min != 0.0 || max != 1.0 {
            out.push_str(&format!("DOMAIN_MIN {:.6} {:.6} {:.6}\n", min, min, min));
            out.push_str(&format!("DOMAIN_MAX {:.6} {:.6} {:.6}\n", max, max, max));
        }
        out.push('\n');
        out
    }
}

impl LutFormat for ResolveCube {
    fn name(&self) -> &'static str {
        "Cube"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["cube"]
    }

    fn capabilities(&self) -> FormatCapabilities {
        FormatCapabilities {
            lut_types: &LutType::ALL,
            range_policy: RangePolicy::FloatOnly,
            range_severity: RangeSeverity::Warn,
            grid_order: GridOrder::RedFastest,
            max_cube_size: MAX_CUBE_SIZE,
            max_curve_size: MAX_CURVE_SIZE,
        }
    }

    fn default_preset(&self) -> Preset {
        Preset::new(LutType::Lut3D, ".cube")
            .with_cube_size(33)
            .with_metadata(
                "Cube LUT",
                format!("Generated by lutkit, cube backend {}", env!("CARGO_PKG_VERSION")),
            )
            .with_version("1.0")
    }

    fn header(&self, preset: &Preset, created: &DateTime<Local>) -> String {
        self.preamble(preset, created, "LUT_3D_SIZE")
    }

    fn header_1d(&self, preset: &Preset, created: &DateTime<Local>) -> Option<String> {
        Some(self.preamble(preset, created, "LUT_1D_SIZE"))
    }

    fn data_line(&self, rgb: [f64; 3]) -> String {
        format!("{:.6} {:.6} {:.6}\n", rgb[0], rgb[1], rgb[2])
    }
}

/// Parses a .cube file, 1D or 3D.
///
/// Data is returned in file order. Curve tables read back as
/// [`LutType::Lut2D`] since the file always stores three columns.
pub fn parse_cube<R: BufRead>(reader: R) -> LutResult<ParsedLut> {
    let mut lut_type: Option<LutType> = None;
    let mut size: Option<usize> = None;
    let mut title = None;
    let mut domain_min: Option<f64> = None;
    let mut domain_max: Option<f64> = None;
    let mut data: Vec<[f64; 3]> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Parse keywords
        if let Some(rest) = line.strip_prefix("TITLE") {
            title = Some(rest.trim().trim_matches('"').to_string());
        } else if line.starts_with("LUT_3D_SIZE") {
            lut_type = Some(LutType::Lut3D);
            size = Some(parse_size(line)?);
        } else if line.starts_with("LUT_1D_SIZE") {
            lut_type = Some(LutType::Lut2D);
            size = Some(parse_size(line)?);
        } else if line.starts_with("DOMAIN_MIN") {
            domain_min = Some(parse_rgb(line, 1)?[0]);
        } else if line.starts_with("DOMAIN_MAX") {
            domain_max = Some(parse_rgb(line, 1)?[0]);
        } else {
            // Data line
            data.push(parse_rgb(line, 0)?);
        }
    }

    let lut_type = lut_type.ok_or_else(|| LutError::Parse("missing LUT_3D_SIZE or LUT_1D_SIZE".into()))?;
    let size = size.unwrap_or(0);
    let expected = match lut_type {
        LutType::Lut3D => size
            .checked_pow(3)
            .ok_or_else(|| LutError::Parse(format!("LUT_3D_SIZE {} is too large", size)))?,
        LutType::Lut1D | LutType::Lut2D => size,
    };

    if data.len() != expected {
        return Err(LutError::Parse(format!(
            "expected {} values, found {}",
            expected,
            data.len()
        )));
    }

    let domain = match (domain_min, domain_max) {
        (None, None) => None,
        (min, max) => Some(ValueRange::float(min.unwrap_or(0.0), max.unwrap_or(1.0))),
    };

    Ok(ParsedLut {
        lut_type,
        size,
        title,
        domain,
        data,
    })
}

// Helper functions

fn parse_size(line: &str) -> LutResult<usize> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(LutError::Parse("invalid size line".into()));
    }
    parts[1]
        .parse()
        .map_err(|_| LutError::Parse("invalid size value".into()))
}

/// Parses three whitespace separated values starting at token `skip`.
fn parse_rgb(line: &str, skip: usize) -> LutResult<[f64; 3]> {
    let parts: Vec<&str> = line.split_whitespace().skip(skip).collect();
    if parts.len() < 3 {
        return Err(LutError::Parse(format!("invalid RGB line: {}", line)));
    }
    Ok([
        parts[0].parse().map_err(|_| LutError::Parse("invalid R value".into()))?,
        parts[1].parse().map_err(|_| LutError::Parse("invalid G value".into()))?,
        parts[2].parse().map_err(|_| LutError::Parse("invalid B value".into()))?,
    ])
}
