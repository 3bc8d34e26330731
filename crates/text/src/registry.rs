use crate::error::FontError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_FONT: &str = "Orbitron";

/// Font names offered by the sketch and the files they load from.
const BUILTIN_FONTS: &[(&str, &str)] = &[
    ("Orbitron", "Orbitron-Black.ttf"),
    ("Audiowide", "Audiowide-Regular.ttf"),
    ("Bungee", "Bungee-Regular.ttf"),
    ("Monoton", "Monoton-Regular.ttf"),
    ("Syncopate", "Syncopate-Bold.ttf"),
];

/// A named font file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAsset {
    pub name: String,
    pub path: PathBuf,
}

/// Fixed mapping from font name to font asset.
#[derive(Debug, Clone)]
pub struct FontRegistry {
    root: PathBuf,
    fonts: Vec<FontAsset>,
    index: BTreeMap<String, usize>,
}

impl FontRegistry {
    /// Registry with no fonts, rooted at `root`.
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            fonts: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// The built-in font table, with files looked up under `root`.
    pub fn builtin(root: impl Into<PathBuf>) -> Self {
        let mut registry = Self::empty(root);
        for (name, file) in BUILTIN_FONTS {
            registry.register(name, file);
        }
        registry
    }

    /// Add or replace a font. `file` is relative to the registry root.
    pub fn register(&mut self, name: &str, file: impl AsRef<Path>) {
        let asset = FontAsset {
            name: name.into(),
            path: self.root.join(file),
        };
        match self.index.get(name) {
            Some(&idx) => self.fonts[idx] = asset,
            None => {
                self.index.insert(name.into(), self.fonts.len());
                self.fonts.push(asset);
            }
        }
    }

    /// Look up a font by name. Never touches the filesystem.
    pub fn resolve(&self, name: &str) -> Result<&FontAsset, FontError> {
        self.index
            .get(name)
            .map(|&idx| &self.fonts[idx])
            .ok_or_else(|| FontError::UnknownFont(name.into()))
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.fonts.iter().map(|f| f.name.clone()).collect()
    }

    pub fn assets(&self) -> &[FontAsset] {
        &self.fonts
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_contains_default() {
        let registry = FontRegistry::builtin("fonts");
        let asset = registry.resolve(DEFAULT_FONT).unwrap();
        assert_eq!(asset.path, Path::new("fonts").join("Orbitron-Black.ttf"));
        assert_eq!(registry.names()[0], DEFAULT_FONT);
    }

    #[test]
    fn unknown_font_is_an_error() {
        let registry = FontRegistry::builtin("fonts");
        match registry.resolve("NonexistentFont") {
            Err(FontError::UnknownFont(name)) => assert_eq!(name, "NonexistentFont"),
            other => panic!("expected UnknownFont, got {other:?}"),
        }
    }

    #[test]
    fn register_replaces_in_place() {
        let mut registry = FontRegistry::empty("/f");
        registry.register("A", "a.ttf");
        registry.register("B", "b.ttf");
        registry.register("A", "a2.ttf");
        assert_eq!(registry.names(), vec!["A".to_string(), "B".to_string()]);
        assert_eq!(registry.resolve("A").unwrap().path, Path::new("/f/a2.ttf"));
    }
}
