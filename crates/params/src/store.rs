use crate::param::{ParamKind, ParamSpec, ParamValue, names};
use std::collections::BTreeMap;

/// Errors from parameter operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("unknown parameter: {0}")]
    Unknown(String),
    #[error("parameter {name} is not a {expected}")]
    KindMismatch { name: String, expected: &'static str },
    #[error("parameter {0} rejects non-finite values")]
    NotFinite(String),
    #[error("{value:?} is not a valid choice for {name}")]
    UnknownChoice { name: String, value: String },
    #[error("parameter {0} has no choices")]
    EmptyChoice(String),
    #[error("parameter {0} is declared twice")]
    Duplicate(String),
}

#[derive(Debug, Clone)]
struct Entry {
    spec: ParamSpec,
    value: ParamValue,
    /// Store revision at which `value` was last committed.
    changed_at: u64,
}

/// Observable store of named tunables.
///
/// Values are read every frame by the render loop and written by whatever
/// control surface is attached. Writes are validated against the declared
/// bounds; numbers are clamped the way a slider would, choices outside the
/// item list are rejected.
#[derive(Debug, Clone, Default)]
pub struct ParamStore {
    entries: Vec<Entry>,
    index: BTreeMap<String, usize>,
    revision: u64,
}

impl ParamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sketch's tunables: `fontSize`, `fontWidth`, `font`, `cameraZ`.
    pub fn with_defaults(fonts: Vec<String>, default_font: &str) -> Result<Self, ParamError> {
        let mut store = Self::new();
        store.declare(ParamSpec::number(names::FONT_SIZE, 33.0, 1.0, 100.0))?;
        store.declare(ParamSpec::number(names::FONT_WIDTH, 0.2, 0.0, 1.0))?;
        store.declare(ParamSpec::choice(names::FONT, fonts, default_font))?;
        store.declare(ParamSpec::number(names::CAMERA_Z, 50.0, 1.0, 100.0))?;
        Ok(store)
    }

    /// Register a tunable at its default value.
    pub fn declare(&mut self, spec: ParamSpec) -> Result<(), ParamError> {
        if self.index.contains_key(&spec.name) {
            return Err(ParamError::Duplicate(spec.name));
        }
        if let ParamKind::Choice { items, default } = &spec.kind {
            if items.is_empty() {
                return Err(ParamError::EmptyChoice(spec.name));
            }
            if !items.contains(default) {
                return Err(ParamError::UnknownChoice {
                    name: spec.name.clone(),
                    value: default.clone(),
                });
            }
        }
        self.revision += 1;
        let value = spec.default_value();
        self.index.insert(spec.name.clone(), self.entries.len());
        self.entries.push(Entry {
            spec,
            value,
            changed_at: self.revision,
        });
        Ok(())
    }

    /// Current revision. Bumped once per committed change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Declared tunables in declaration order.
    pub fn specs(&self) -> impl Iterator<Item = &ParamSpec> {
        self.entries.iter().map(|e| &e.spec)
    }

    pub fn spec(&self, name: &str) -> Option<&ParamSpec> {
        self.entry(name).ok().map(|e| &e.spec)
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entry(name).ok().map(|e| &e.value)
    }

    pub fn get_number(&self, name: &str) -> Result<f32, ParamError> {
        self.entry(name)?
            .value
            .as_number()
            .ok_or_else(|| ParamError::KindMismatch {
                name: name.into(),
                expected: "number",
            })
    }

    pub fn get_choice(&self, name: &str) -> Result<&str, ParamError> {
        self.entry(name)?
            .value
            .as_choice()
            .ok_or_else(|| ParamError::KindMismatch {
                name: name.into(),
                expected: "choice",
            })
    }

    /// Set a number, clamped to its bounds. Returns whether the value changed.
    pub fn set_number(&mut self, name: &str, value: f32) -> Result<bool, ParamError> {
        if !value.is_finite() {
            return Err(ParamError::NotFinite(name.into()));
        }
        let idx = self.position(name)?;
        let ParamKind::Number { min, max, .. } = self.entries[idx].spec.kind else {
            return Err(ParamError::KindMismatch {
                name: name.into(),
                expected: "number",
            });
        };
        let clamped = value.clamp(min, max);
        if clamped != value {
            tracing::debug!("{name}: {value} clamped to {clamped}");
        }
        Ok(self.commit(idx, ParamValue::Number(clamped)))
    }

    /// Select one of a choice parameter's items. Returns whether the value changed.
    pub fn set_choice(&mut self, name: &str, item: &str) -> Result<bool, ParamError> {
        let idx = self.position(name)?;
        let ParamKind::Choice { items, .. } = &self.entries[idx].spec.kind else {
            return Err(ParamError::KindMismatch {
                name: name.into(),
                expected: "choice",
            });
        };
        if !items.iter().any(|i| i == item) {
            return Err(ParamError::UnknownChoice {
                name: name.into(),
                value: item.into(),
            });
        }
        Ok(self.commit(idx, ParamValue::Choice(item.into())))
    }

    /// Restore one tunable to its default.
    pub fn reset(&mut self, name: &str) -> Result<bool, ParamError> {
        let idx = self.position(name)?;
        let default = self.entries[idx].spec.default_value();
        Ok(self.commit(idx, default))
    }

    /// Restore every tunable to its default.
    pub fn reset_all(&mut self) {
        for idx in 0..self.entries.len() {
            let default = self.entries[idx].spec.default_value();
            self.commit(idx, default);
        }
    }

    /// Start tracking changes from the current revision.
    pub fn watch(&self) -> Watcher {
        Watcher {
            seen: self.revision,
        }
    }

    fn commit(&mut self, idx: usize, value: ParamValue) -> bool {
        let entry = &mut self.entries[idx];
        if entry.value == value {
            return false;
        }
        self.revision += 1;
        tracing::debug!(
            "param {} = {} (rev {})",
            entry.spec.name,
            value,
            self.revision
        );
        entry.value = value;
        entry.changed_at = self.revision;
        true
    }

    fn position(&self, name: &str) -> Result<usize, ParamError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| ParamError::Unknown(name.into()))
    }

    fn entry(&self, name: &str) -> Result<&Entry, ParamError> {
        self.position(name).map(|idx| &self.entries[idx])
    }
}

/// Polling subscriber over a [`ParamStore`].
///
/// Holds only the last revision it has seen, so any number of consumers can
/// watch the same store without the store knowing about them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watcher {
    seen: u64,
}

impl Watcher {
    /// Names changed since the previous poll, in declaration order.
    pub fn poll(&mut self, store: &ParamStore) -> Vec<String> {
        let changed = store
            .entries
            .iter()
            .filter(|e| e.changed_at > self.seen)
            .map(|e| e.spec.name.clone())
            .collect();
        self.seen = store.revision;
        changed
    }

    /// Whether anything changed since the previous poll, without consuming it.
    pub fn is_dirty(&self, store: &ParamStore) -> bool {
        store.revision > self.seen
    }
}
