//! Christophe Lorenz Colour Cube (.cc) format.
//!
//! Text format holding a single 3D cube. There are no curve tables, so
//! 1D/2D exports are refused.
//!
//! # Format
//!
//! ```text
//! Colour Cube data 1
//! 1
//!
//! Name
//! Christophe Lorenz CC LUT
//! Description
//! Generated by lutkit
//! Input Colour space - RGB=1, CIEXYZ=2, DENSITY=3
//! 1
//! Output Colour space - RGB=1, CIEXYZ=2, DENSITY=3
//! 1
//! Size x,y,z
//! 2,2,2
//! Name component A
//! component A
//! Name component B
//! component B
//! Name component C
//! component C
//! Creation Date
//! 2024-05-01 14:03:07.123456
//! Data
//! 0.000000,0.000000,0.000000
//! 1.000000,0.000000,0.000000
//! ...
//! ```
//!
//! - Red coordinate changes fastest, then green, then blue
//! - Values are real numbers with six decimals, comma separated
//! - Colour space codes are always RGB (1)
//! - Title and comment are single lines; each header key is followed by
//!   exactly one value line

use std::io::BufRead;

use lutkit_core::{
    format_timestamp, validate_capabilities, DateTime, FieldRule, FormatCapabilities, Local, LutError, LutFormat,
    LutResult, LutType, Preset, ValidationMode, ValueRange,
};

use crate::ParsedLut;

/// RGB code in the colour space header lines.
const COLOUR_SPACE_RGB: u8 = 1;

/// Header lines whose next line is a value.
const HEADER_KEYS: &[&str] = &[
    "Name",
    "Description",
    "Input Colour space - RGB=1, CIEXYZ=2, DENSITY=3",
    "Output Colour space - RGB=1, CIEXYZ=2, DENSITY=3",
    "Size x,y,z",
    "Name component A",
    "Name component B",
    "Name component C",
    "Creation Date",
];

fn single_line(text: &str) -> bool {
    !text.contains(['\n', '\r'])
}

/// Colour Cube backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColourCube;

impl LutFormat for ColourCube {
    fn name(&self) -> &'static str {
        "Colour Cube"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["cc"]
    }

    fn capabilities(&self) -> FormatCapabilities {
        FormatCapabilities::float_3d()
    }

    fn default_preset(&self) -> Preset {
        Preset::new(LutType::Lut3D, ".cc")
            .with_in_range(ValueRange::float(0.0, 1.0))
            .with_out_range(ValueRange::float(0.0, 1.0))
            .with_cube_size(32)
            .with_metadata(
                "Christophe Lorenz CC LUT",
                format!("Generated by lutkit, clcc backend {}", env!("CARGO_PKG_VERSION")),
            )
            .with_version("1")
    }

    fn header(&self, preset: &Preset, created: &DateTime<Local>) -> String {
        let n = preset.cube_size;
        format!(
            "Colour Cube data {version}\n\
             {version}\n\
             \n\
             Name\n\
             {title}\n\
             Description\n\
             {comment}\n\
             Input Colour space - RGB=1, CIEXYZ=2, DENSITY=3\n\
             {cs}\n\
             Output Colour space - RGB=1, CIEXYZ=2, DENSITY=3\n\
             {cs}\n\
             Size x,y,z\n\
             {n},{n},{n}\n\
             Name component A\n\
             component A\n\
             Name component B\n\
             component B\n\
             Name component C\n\
             component C\n\
             Creation Date\n\
             {date}\n\
             Data\n",
            version = preset.version,
            title = preset.title,
            comment = preset.comment,
            cs = COLOUR_SPACE_RGB,
            n = n,
            date = format_timestamp(created),
        )
    }

    fn data_line(&self, rgb: [f64; 3]) -> String {
        format!("{:.6},{:.6},{:.6}\n", rgb[0], rgb[1], rgb[2])
    }

    fn validate_specific(&self, preset: Preset, mode: ValidationMode) -> LutResult<Preset> {
        let mut preset = validate_capabilities(self, preset, mode)?;
        let default = self.default_preset();
        let rule = FieldRule { format: self.name(), mode };

        let title_ok = single_line(&preset.title);
        rule.enforce("title", &mut preset.title, &default.title, title_ok, "a single line of text")?;
        let comment_ok = single_line(&preset.comment);
        rule.enforce("comment", &mut preset.comment, &default.comment, comment_ok, "a single line of text")?;
        let version_ok = single_line(&preset.version);
        rule.enforce("version", &mut preset.version, &default.version, version_ok, "a single line of text")?;

        Ok(preset)
    }

    fn range_message(&self, out_range: &ValueRange) -> String {
        format!(
            "Colour Cube output range is expected to be float. Ex: [0.0, 1.0].\nYour range {}",
            out_range
        )
    }
}

/// Parses a Colour Cube file.
///
/// Only the fields needed to read the cube back are interpreted: title,
/// size and data lines. The line after a header key is always its value,
/// so a title or description reading `Data` does not start the data block.
pub fn parse_cc<R: BufRead>(reader: R) -> LutResult<ParsedLut> {
    let mut title = None;
    let mut size: Option<usize> = None;
    let mut data: Vec<[f64; 3]> = Vec::new();
    let mut pending: Option<&str> = None;
    let mut in_data = false;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();

        if in_data {
            if trimmed.is_empty() {
                continue;
            }
            data.push(parse_triple(trimmed, line_num + 1)?);
            continue;
        }

        if let Some(key) = pending.take() {
            match key {
                "Name" => title = Some(trimmed.to_string()),
                "Size x,y,z" => size = Some(parse_size(trimmed, line_num + 1)?),
                _ => {}
            }
            continue;
        }

        if trimmed == "Data" {
            in_data = true;
        } else if trimmed.starts_with("Colour Cube data") {
            // version repeated on the next line
            pending = Some("version");
        } else if let Some(key) = HEADER_KEYS.iter().find(|k| **k == trimmed) {
            pending = Some(*key);
        }
    }

    let size = size.ok_or_else(|| LutError::Parse("missing 'Size x,y,z'".into()))?;
    let expected = size
        .checked_pow(3)
        .ok_or_else(|| LutError::Parse(format!("cube size {} is too large", size)))?;
    if data.len() != expected {
        return Err(LutError::Parse(format!(
            "expected {} entries, found {}",
            expected,
            data.len()
        )));
    }

    Ok(ParsedLut {
        lut_type: LutType::Lut3D,
        size,
        title,
        domain: None,
        data,
    })
}

fn parse_size(line: &str, line_num: usize) -> LutResult<usize> {
    let dims: Vec<usize> = line
        .split(',')
        .map(|v| v.trim().parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|_| LutError::Parse(format!("invalid size at line {}", line_num)))?;
    match dims.as_slice() {
        [x, y, z] if x == y && y == z => Ok(*x),
        _ => Err(LutError::Parse(format!(
            "expected equal x,y,z sizes at line {}",
            line_num
        ))),
    }
}

fn parse_triple(line: &str, line_num: usize) -> LutResult<[f64; 3]> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() != 3 {
        return Err(LutError::Parse(format!(
            "expected 3 values at line {}, got {}",
            line_num,
            parts.len()
        )));
    }
    let mut rgb = [0.0f64; 3];
    for (slot, part) in rgb.iter_mut().zip(parts) {
        *slot = part
            .trim()
            .parse()
            .map_err(|_| LutError::Parse(format!("invalid float at line {}", line_num)))?;
    }
    Ok(rgb)
}
