//! Export driver shared by every backend.
//!
//! One export call runs validation, sampling, the output range check and
//! the file write, in that order. Any failure stops the call before the
//! destination is touched: content is assembled in memory, written to a
//! temporary file next to the destination and only then moved over it.
//!
//! # Example
//!
//! ```rust,ignore
//! use lutkit_core::LutExporter;
//! use lutkit_formats::ColourCube;
//!
//! let format = ColourCube;
//! let exporter = LutExporter::new(&format);
//! let preset = format.default_preset().with_cube_size(17);
//! exporter.write_3d_lut(&|rgb: [f64; 3]| rgb, "identity.cc".as_ref(), &preset)?;
//! ```

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};
use tempfile::NamedTempFile;

use crate::format::validate_preset;
use crate::{
    join_types, ColorTransform, LutError, LutFormat, LutResult, LutType, Notifier, Preset, PresetFields,
    RangeSeverity, SampleGrid, Sampler, TracingNotifier, ValidationMode,
};

static TRACING_NOTIFIER: TracingNotifier = TracingNotifier;

/// Runs exports for one backend.
pub struct LutExporter<'a> {
    format: &'a dyn LutFormat,
    notifier: &'a dyn Notifier,
    mode: ValidationMode,
    sampler: Sampler,
}

impl<'a> LutExporter<'a> {
    /// Strict, sequential exporter reporting through `tracing`.
    pub fn new(format: &'a dyn LutFormat) -> Self {
        Self {
            format,
            notifier: &TRACING_NOTIFIER,
            mode: ValidationMode::Strict,
            sampler: Sampler::new(),
        }
    }

    /// Sets the notification channel.
    pub fn with_notifier(mut self, notifier: &'a dyn Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Sets the validation mode.
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the sampler.
    pub fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// Backend this exporter writes.
    pub fn format(&self) -> &'a dyn LutFormat {
        self.format
    }

    /// Validation mode.
    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Validates and normalizes `preset`.
    ///
    /// Strict failures are reported through the notifier before returning.
    pub fn validate(&self, preset: &Preset) -> LutResult<Preset> {
        validate_preset(self.format, preset.clone(), self.mode).map_err(|e| self.fail(e))
    }

    /// Builds a preset from a preset source: missing fields come from the
    /// backend default, then the result is validated.
    ///
    /// Failures are reported through the notifier before returning.
    pub fn resolve(&self, fields: PresetFields) -> LutResult<Preset> {
        let default = self.format.default_preset();
        let preset = fields
            .resolve(self.format.name(), &default, self.mode)
            .map_err(|e| self.fail(e))?;
        self.validate(&preset)
    }

    /// Parses a YAML preset source and resolves it with [`resolve`](Self::resolve).
    pub fn preset_from_yaml(&self, text: &str) -> LutResult<Preset> {
        let fields = PresetFields::from_yaml_with(text, self.mode).map_err(|e| self.fail(e))?;
        self.resolve(fields)
    }

    /// Checks the declared output range against the backend's range policy.
    ///
    /// Depending on the backend's severity a violation is either logged as
    /// a warning or reported and returned as [`LutError::Range`].
    pub fn check_output_range(&self, preset: &Preset) -> LutResult<()> {
        let caps = self.format.capabilities();
        if caps.range_policy.accepts(&preset.out_range) {
            return Ok(());
        }
        let message = self.format.range_message(&preset.out_range);
        match caps.range_severity {
            RangeSeverity::Warn => {
                tracing::warn!(format = self.format.name(), "{}", message);
                Ok(())
            }
            RangeSeverity::Error => Err(self.fail(LutError::Range {
                format: self.format.name(),
                message,
            })),
        }
    }

    /// Builds the full content of a 3D file from an already validated preset.
    pub fn render_3d<T>(&self, transform: &T, preset: &Preset, created: &DateTime<Local>) -> LutResult<String>
    where
        T: ColorTransform + Sync + ?Sized,
    {
        let grid = self
            .sampler
            .sample_3d(transform, preset, self.format.capabilities().grid_order)
            .map_err(|e| self.fail(e))?;
        self.check_output_range(preset)?;
        Ok(self.assemble(self.format.header(preset, created), &grid))
    }

    /// Builds the full content of a 1D/2D file from an already validated preset.
    pub fn render_1d_2d<T>(&self, transform: &T, preset: &Preset, created: &DateTime<Local>) -> LutResult<String>
    where
        T: ColorTransform + Sync + ?Sized,
    {
        let header = match self.format.header_1d(preset, created) {
            Some(header) if self.format.capabilities().supports_curves() => header,
            _ => return Err(self.fail(self.unsupported_curves())),
        };
        let grid = self.sampler.sample_1d(transform, preset);
        self.check_output_range(preset)?;
        Ok(self.assemble(header, &grid))
    }

    /// Samples `transform` on a 3D grid and writes it to `path`.
    ///
    /// The preset must describe a 3D LUT; lenient mode converts a curve
    /// preset instead. It is then validated. On success `path` holds one
    /// header followed by `cube_size^3` data lines in the backend's node
    /// order and a success message naming `path` is emitted. On failure
    /// `path` is left as it was.
    pub fn write_3d_lut<T>(&self, transform: &T, path: &Path, preset: &Preset) -> LutResult<()>
    where
        T: ColorTransform + Sync + ?Sized,
    {
        let preset = self.fit_kind(preset, true)?;
        let preset = self.validate(&preset)?;
        let content = self.render_3d(transform, &preset, &Local::now())?;
        self.commit(path, &content)
    }

    /// Samples `transform` as a 1D/2D curve and writes it to `path`.
    ///
    /// Backends that only store cubes always fail with
    /// [`LutError::UnsupportedOperation`] and never touch `path`. A 3D
    /// preset is rejected, or converted to a curve in lenient mode.
    pub fn write_1d_2d_lut<T>(&self, transform: &T, path: &Path, preset: &Preset) -> LutResult<()>
    where
        T: ColorTransform + Sync + ?Sized,
    {
        if !self.format.capabilities().supports_curves() {
            return Err(self.fail(self.unsupported_curves()));
        }
        let preset = self.fit_kind(preset, false)?;
        let preset = self.validate(&preset)?;
        let content = self.render_1d_2d(transform, &preset, &Local::now())?;
        self.commit(path, &content)
    }

    /// Writes a 1D/2D or 3D file depending on the validated preset's type.
    pub fn write_lut<T>(&self, transform: &T, path: &Path, preset: &Preset) -> LutResult<()>
    where
        T: ColorTransform + Sync + ?Sized,
    {
        let preset = self.validate(preset)?;
        let created = Local::now();
        let content = match preset.lut_type {
            LutType::Lut3D => self.render_3d(transform, &preset, &created)?,
            LutType::Lut1D | LutType::Lut2D => self.render_1d_2d(transform, &preset, &created)?,
        };
        self.commit(path, &content)
    }

    /// Makes sure the preset's type matches a cube (`cube`) or curve export.
    fn fit_kind(&self, preset: &Preset, cube: bool) -> LutResult<Preset> {
        if (preset.lut_type == LutType::Lut3D) == cube {
            return Ok(preset.clone());
        }
        let wanted: Vec<LutType> = self
            .format
            .capabilities()
            .lut_types
            .iter()
            .copied()
            .filter(|t| (*t == LutType::Lut3D) == cube)
            .collect();
        let Some(&target) = wanted.first() else {
            return Err(self.fail(LutError::UnsupportedOperation {
                format: self.format.name(),
                message: format!("3D LUT is not supported in {} format", self.format.name()),
            }));
        };
        match self.mode {
            ValidationMode::Lenient => {
                tracing::debug!(format = self.format.name(), from = %preset.lut_type, to = %target, "LUT type converted for export");
                Ok(preset.clone().with_type(target))
            }
            ValidationMode::Strict => Err(self.fail(LutError::Validation {
                format: self.format.name(),
                field: "type",
                value: preset.lut_type.to_string(),
                allowed: join_types(&wanted),
            })),
        }
    }

    fn assemble(&self, header: String, grid: &SampleGrid) -> String {
        let mut content = header;
        for rgb in &grid.outputs {
            content.push_str(&self.format.data_line(*rgb));
        }
        content
    }

    fn commit(&self, path: &Path, content: &str) -> LutResult<()> {
        tracing::debug!(format = self.format.name(), path = %path.display(), bytes = content.len(), "writing LUT");
        write_atomic(path, content).map_err(|e| self.fail(LutError::Io(e)))?;
        self.notifier.success(&self.format.export_message(path));
        Ok(())
    }

    fn unsupported_curves(&self) -> LutError {
        LutError::UnsupportedOperation {
            format: self.format.name(),
            message: format!("1D/2D LUT is not supported in {} format, it only stores 3D cubes", self.format.name()),
        }
    }

    fn fail(&self, err: LutError) -> LutError {
        self.notifier.error(&err.to_string());
        err
    }
}

/// Writes `content` to a temporary file beside `path` and moves it over
/// `path`. A failed write leaves `path` untouched.
fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FormatCapabilities, GridOrder, MemoryNotifier, Notification, RangePolicy, ValueRange};
    use chrono::TimeZone;
    use tempfile::tempdir;

    /// Minimal cube format: size line then space separated triples.
    struct Plain;

    impl LutFormat for Plain {
        fn name(&self) -> &'static str {
            "Plain"
        }
        fn extensions(&self) -> &'static [&'static str] {
            &["plain"]
        }
        fn capabilities(&self) -> FormatCapabilities {
            FormatCapabilities::float_3d()
        }
        fn default_preset(&self) -> Preset {
            Preset::new(LutType::Lut3D, ".plain").with_cube_size(4)
        }
        fn header(&self, preset: &Preset, created: &DateTime<Local>) -> String {
            format!("SIZE {}\n# {}\n", preset.cube_size, crate::format_timestamp(created))
        }
        fn data_line(&self, rgb: [f64; 3]) -> String {
            format!("{:.2} {:.2} {:.2}\n", rgb[0], rgb[1], rgb[2])
        }
    }

    /// Same as `Plain` but with curve support and a lenient range policy.
    struct PlainCurves;

    impl LutFormat for PlainCurves {
        fn name(&self) -> &'static str {
            "PlainCurves"
        }
        fn extensions(&self) -> &'static [&'static str] {
            &["pcrv"]
        }
        fn capabilities(&self) -> FormatCapabilities {
            FormatCapabilities {
                lut_types: &LutType::ALL,
                range_policy: RangePolicy::FloatOnly,
                range_severity: RangeSeverity::Warn,
                grid_order: GridOrder::BlueFastest,
                max_cube_size: 64,
                max_curve_size: 4096,
            }
        }
        fn default_preset(&self) -> Preset {
            Preset::new(LutType::Lut1D, ".pcrv").with_cube_size(4)
        }
        fn header(&self, preset: &Preset, _: &DateTime<Local>) -> String {
            format!("CUBE {}\n", preset.cube_size)
        }
        fn header_1d(&self, preset: &Preset, _: &DateTime<Local>) -> Option<String> {
            Some(format!("CURVE {}\n", preset.cube_size))
        }
        fn data_line(&self, rgb: [f64; 3]) -> String {
            format!("{:.2} {:.2} {:.2}\n", rgb[0], rgb[1], rgb[2])
        }
    }

    fn identity(rgb: [f64; 3]) -> [f64; 3] {
        rgb
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn render_identity_cube() {
        let exporter = LutExporter::new(&Plain);
        let preset = Plain.default_preset().with_cube_size(2);
        let text = exporter.render_3d(&identity, &preset, &fixed_time()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "SIZE 2");
        assert_eq!(lines.len(), 2 + 8);
        assert_eq!(lines[3], "1.00 0.00 0.00");
        assert_eq!(lines[9], "1.00 1.00 1.00");
    }

    #[test]
    fn write_and_notify() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.plain");
        let notifier = MemoryNotifier::new();
        let exporter = LutExporter::new(&Plain).with_notifier(&notifier);

        exporter.write_3d_lut(&identity, &path, &Plain.default_preset()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2 + 64);
        let messages = notifier.take();
        assert_eq!(messages.len(), 1);
        assert!(matches!(&messages[0], Notification::Success(m) if m.contains("out.plain")));
    }

    #[test]
    fn strict_type_rejected_without_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.plain");
        let notifier = MemoryNotifier::new();
        let exporter = LutExporter::new(&Plain).with_notifier(&notifier);
        let preset = Plain.default_preset().with_type(LutType::Lut1D);

        let err = exporter.write_3d_lut(&identity, &path, &preset).unwrap_err();
        assert!(matches!(err, LutError::Validation { field: "type", .. }));
        assert!(!path.exists());
        assert_eq!(notifier.take().len(), 1);
    }

    #[test]
    fn integer_range_is_fatal_for_error_severity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.plain");
        std::fs::write(&path, "previous").unwrap();
        let notifier = MemoryNotifier::new();
        let exporter = LutExporter::new(&Plain).with_notifier(&notifier);
        let preset = Plain.default_preset().with_out_range(ValueRange::int(0, 1023));

        let err = exporter.write_3d_lut(&identity, &path, &preset).unwrap_err();
        assert!(matches!(err, LutError::Range { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");
        assert_eq!(notifier.take(), vec![Notification::Error(err.to_string())]);
        // no temporary file left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn integer_range_warns_for_warn_severity() {
        let exporter = LutExporter::new(&PlainCurves);
        let preset = PlainCurves
            .default_preset()
            .with_type(LutType::Lut3D)
            .with_cube_size(2)
            .with_out_range(ValueRange::int(0, 1023));
        assert!(exporter.check_output_range(&preset).is_ok());
        let text = exporter.render_3d(&identity, &preset, &fixed_time()).unwrap();
        // blue fastest
        assert_eq!(text.lines().nth(2), Some("0.00 0.00 1.00"));
    }

    #[test]
    fn curves_unsupported_on_cube_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.plain");
        let notifier = MemoryNotifier::new();
        let exporter = LutExporter::new(&Plain).with_notifier(&notifier);

        let err = exporter
            .write_1d_2d_lut(&identity, &path, &Plain.default_preset())
            .unwrap_err();
        match err {
            LutError::UnsupportedOperation { format, ref message } => {
                assert_eq!(format, "Plain");
                assert!(message.contains("1D/2D"));
            }
            ref other => panic!("unexpected error: {other}"),
        }
        assert!(!path.exists());
        assert_eq!(notifier.take().len(), 1);
    }

    #[test]
    fn write_lut_dispatches_on_type() {
        let dir = tempdir().unwrap();
        let exporter = LutExporter::new(&PlainCurves);

        let curve = dir.path().join("curve.pcrv");
        exporter
            .write_lut(&identity, &curve, &PlainCurves.default_preset())
            .unwrap();
        let text = std::fs::read_to_string(&curve).unwrap();
        assert!(text.starts_with("CURVE 4\n"));
        assert_eq!(text.lines().count(), 1 + 4);

        let cube = dir.path().join("cube.pcrv");
        let preset = PlainCurves.default_preset().with_type(LutType::Lut3D).with_cube_size(3);
        exporter.write_lut(&identity, &cube, &preset).unwrap();
        let text = std::fs::read_to_string(&cube).unwrap();
        assert!(text.starts_with("CUBE 3\n"));
        assert_eq!(text.lines().count(), 1 + 27);
    }

    #[test]
    fn lenient_mode_replaces_type() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.plain");
        let exporter = LutExporter::new(&Plain).with_mode(ValidationMode::Lenient);
        let preset = Plain.default_preset().with_type(LutType::Lut2D).with_cube_size(2);

        exporter.write_lut(&identity, &path, &preset).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("SIZE 2\n"));
        assert_eq!(text.lines().count(), 2 + 8);
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.plain");
        std::fs::write(&path, "stale").unwrap();
        let exporter = LutExporter::new(&Plain);
        exporter
            .write_3d_lut(&identity, &path, &Plain.default_preset().with_cube_size(1))
            .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("0.00 0.00 0.00\n"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn io_failure_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.plain");
        let notifier = MemoryNotifier::new();
        let exporter = LutExporter::new(&Plain).with_notifier(&notifier);

        let err = exporter
            .write_3d_lut(&identity, &path, &Plain.default_preset())
            .unwrap_err();
        assert!(matches!(err, LutError::Io(_)));
        assert!(matches!(&notifier.take()[..], [Notification::Error(_)]));
    }

    #[test]
    fn cube_export_refuses_curve_preset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.pcrv");
        let notifier = MemoryNotifier::new();
        let preset = PlainCurves.default_preset().with_type(LutType::Lut1D);

        let strict = LutExporter::new(&PlainCurves).with_notifier(&notifier);
        let err = strict.write_3d_lut(&identity, &path, &preset).unwrap_err();
        match err {
            LutError::Validation { field, ref value, ref allowed, .. } => {
                assert_eq!(field, "type");
                assert_eq!(value, "1D");
                assert_eq!(allowed, "'3D'");
            }
            ref other => panic!("unexpected error: {other}"),
        }
        assert!(!path.exists());
        assert_eq!(notifier.take().len(), 1);

        let lenient = strict.with_mode(ValidationMode::Lenient);
        lenient.write_3d_lut(&identity, &path, &preset).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("CUBE 4\n"));
        assert_eq!(text.lines().count(), 1 + 64);
    }

    #[test]
    fn curve_export_refuses_cube_preset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.pcrv");
        let notifier = MemoryNotifier::new();
        let preset = PlainCurves.default_preset().with_type(LutType::Lut3D).with_cube_size(3);

        let strict = LutExporter::new(&PlainCurves).with_notifier(&notifier);
        let err = strict.write_1d_2d_lut(&identity, &path, &preset).unwrap_err();
        assert!(matches!(err, LutError::Validation { field: "type", ref allowed, .. } if allowed == "'1D', '2D'"));
        assert!(!path.exists());
        assert_eq!(notifier.take().len(), 1);

        let lenient = strict.with_mode(ValidationMode::Lenient);
        lenient.write_1d_2d_lut(&identity, &path, &preset).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("CURVE 3\n"));
        assert_eq!(text.lines().count(), 1 + 3);
    }

    #[test]
    fn oversized_cube_never_samples() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.plain");
        let notifier = MemoryNotifier::new();
        let exporter = LutExporter::new(&Plain).with_notifier(&notifier);
        let preset = Plain.default_preset().with_cube_size(1 << 22);

        let err = exporter.write_3d_lut(&identity, &path, &preset).unwrap_err();
        assert!(matches!(err, LutError::Validation { field: "cube_size", .. }));
        assert!(!path.exists());
        assert_eq!(notifier.take().len(), 1);

        let err = exporter.render_3d(&identity, &preset, &fixed_time()).unwrap_err();
        assert!(matches!(err, LutError::GridSize { .. }));
        assert_eq!(notifier.take().len(), 1);

        let lenient = exporter.with_mode(ValidationMode::Lenient);
        lenient.write_3d_lut(&identity, &path, &preset).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2 + 64);
    }

    #[test]
    fn resolve_reports_bad_source() {
        let notifier = MemoryNotifier::new();
        let exporter = LutExporter::new(&Plain).with_notifier(&notifier);

        let fields = PresetFields {
            lut_type: Some("4D".into()),
            ..Default::default()
        };
        let err = exporter.resolve(fields).unwrap_err();
        assert!(matches!(err, LutError::Validation { field: "type", .. }));
        assert_eq!(notifier.take(), vec![Notification::Error(err.to_string())]);

        let err = exporter.preset_from_yaml("cube_size: -1\n").unwrap_err();
        assert!(matches!(err, LutError::Preset(_)));
        assert_eq!(notifier.take().len(), 1);

        let lenient = exporter.with_mode(ValidationMode::Lenient);
        let preset = lenient.preset_from_yaml("type: 4D\ncube_size: -1\next: .plain\n").unwrap();
        assert_eq!(preset, Plain.default_preset());
        assert!(notifier.take().is_empty());
    }
}
