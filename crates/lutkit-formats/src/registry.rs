//! Format registry for looking up LUT backends.
//!
//! The registry provides a central place to:
//! - Register format backends
//! - Find a backend by file extension or by name
//! - List available formats
//!
//! A registry is an ordinary value; [`FormatRegistry::builtin`] builds one
//! with every backend of this crate whenever it is needed.
//!
//! # Example
//!
//! ```rust
//! use lutkit_formats::FormatRegistry;
//!
//! let registry = FormatRegistry::builtin();
//! assert!(registry.supports_extension(".cc"));
//! let format = registry.by_extension("cube").unwrap();
//! assert_eq!(format.name(), "Cube");
//! ```

use std::collections::HashMap;
use std::path::Path;

use lutkit_core::LutFormat;

use crate::{ColourCube, ResolveCube};

/// Collection of format backends keyed by name and extension.
pub struct FormatRegistry {
    formats: Vec<Box<dyn LutFormat>>,
    by_extension: HashMap<String, usize>,
}

impl FormatRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            formats: Vec::new(),
            by_extension: HashMap::new(),
        }
    }

    /// Registry holding every built-in backend.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ColourCube));
        registry.register(Box::new(ResolveCube));
        registry
    }

    /// Adds a backend. Extensions already claimed move to the new backend.
    pub fn register(&mut self, format: Box<dyn LutFormat>) {
        let idx = self.formats.len();
        for ext in format.extensions() {
            self.by_extension.insert(normalize_ext(ext), idx);
        }
        tracing::debug!(name = format.name(), extensions = ?format.extensions(), "registered LUT format");
        self.formats.push(format);
    }

    /// Backend for an extension, with or without the leading dot.
    pub fn by_extension(&self, ext: &str) -> Option<&dyn LutFormat> {
        self.by_extension
            .get(&normalize_ext(ext))
            .map(|&idx| self.formats[idx].as_ref())
    }

    /// Backend for the extension of `path`.
    pub fn for_path(&self, path: &Path) -> Option<&dyn LutFormat> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| self.by_extension(e))
    }

    /// Backend by name, case-insensitive.
    pub fn by_name(&self, name: &str) -> Option<&dyn LutFormat> {
        self.formats
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
            .map(|f| f.as_ref())
    }

    /// Returns true if some backend writes `ext`.
    pub fn supports_extension(&self, ext: &str) -> bool {
        self.by_extension.contains_key(&normalize_ext(ext))
    }

    /// Names of all registered backends, in registration order.
    pub fn format_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.formats.iter().map(|f| f.name())
    }

    /// All registered backends.
    pub fn formats(&self) -> impl Iterator<Item = &dyn LutFormat> {
        self.formats.iter().map(|f| f.as_ref())
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize_ext(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}
