use crate::error::FontError;
use crate::layout::build_text_mesh;
use crate::loader::{FontLoader, GlyphSource};
use crate::registry::FontRegistry;
use endless_common::Transform;
use endless_params::{ParamStore, names};
use endless_scene::{MeshArena, MeshId};
use glam::Vec3;
use std::collections::HashMap;

/// Everything the text mesh depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub text: String,
    pub font: String,
    pub font_size: f32,
    pub font_width: f32,
}

impl TextRequest {
    /// Read `font`, `fontSize` and `fontWidth` from the parameter surface.
    pub fn from_params(text: &str, params: &ParamStore) -> Result<Self, FontError> {
        Ok(Self {
            text: text.into(),
            font: params.get_choice(names::FONT)?.into(),
            font_size: params.get_number(names::FONT_SIZE)?,
            font_width: params.get_number(names::FONT_WIDTH)?,
        })
    }

    fn transform(&self) -> Transform {
        Transform::from_scale(Vec3::new(self.font_width, 1.0, 1.0))
    }
}

/// What a [`TextMeshProvider::sync`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// First mesh built; a new arena slot was allocated.
    Created(MeshId),
    /// Geometry rebuilt in the existing slot.
    Regenerated(MeshId),
    /// Only the horizontal scale changed.
    Rescaled(MeshId),
    Unchanged(MeshId),
}

impl SyncOutcome {
    pub fn mesh(self) -> MeshId {
        match self {
            Self::Created(id) | Self::Regenerated(id) | Self::Rescaled(id) | Self::Unchanged(id) => {
                id
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct GeometryKey {
    text: String,
    font: String,
    font_size: f32,
}

/// Keeps one text mesh in the arena in step with a [`TextRequest`].
pub struct TextMeshProvider<L: FontLoader> {
    registry: FontRegistry,
    loader: L,
    loaded: HashMap<String, Box<dyn GlyphSource>>,
    mesh: Option<MeshId>,
    key: Option<GeometryKey>,
    font_width: f32,
    regenerations: u64,
}

impl<L: FontLoader> TextMeshProvider<L> {
    pub fn new(registry: FontRegistry, loader: L) -> Self {
        Self {
            registry,
            loader,
            loaded: HashMap::new(),
            mesh: None,
            key: None,
            font_width: f32::NAN,
            regenerations: 0,
        }
    }

    pub fn registry(&self) -> &FontRegistry {
        &self.registry
    }

    /// The arena slot holding the text, once built.
    pub fn mesh(&self) -> Option<MeshId> {
        self.mesh
    }

    /// How many times geometry has been built, including the first.
    pub fn regenerations(&self) -> u64 {
        self.regenerations
    }

    /// Bring the arena's text mesh up to date with `request`.
    ///
    /// The font name is resolved first; an unknown name fails before any
    /// font is loaded or any geometry is built, leaving the arena as it was.
    pub fn sync(
        &mut self,
        request: &TextRequest,
        arena: &mut MeshArena,
    ) -> Result<SyncOutcome, FontError> {
        let asset = self.registry.resolve(&request.font)?.clone();

        let key = GeometryKey {
            text: request.text.clone(),
            font: request.font.clone(),
            font_size: request.font_size,
        };
        let live = self.mesh.filter(|id| arena.contains(*id));

        if let Some(id) = live {
            // Width is applied before any font load so a failing font
            // cannot hold the scale back.
            let rescaled = self.font_width != request.font_width;
            if rescaled {
                arena.set_transform(id, request.transform())?;
                self.font_width = request.font_width;
            }
            if self.key.as_ref() == Some(&key) {
                return Ok(if rescaled {
                    SyncOutcome::Rescaled(id)
                } else {
                    SyncOutcome::Unchanged(id)
                });
            }
        }

        if !self.loaded.contains_key(&asset.name) {
            let source = self.loader.load(&asset)?;
            self.loaded.insert(asset.name.clone(), source);
        }
        let source = self
            .loaded
            .get(&asset.name)
            .ok_or_else(|| FontError::UnknownFont(asset.name.clone()))?;
        let mesh = build_text_mesh(source.as_ref(), &request.text, request.font_size)?;
        self.regenerations += 1;

        let outcome = match live {
            Some(id) => {
                arena.replace(id, mesh)?;
                arena.set_transform(id, request.transform())?;
                tracing::debug!(
                    "text regenerated: {:?} in {} at {}",
                    request.text,
                    request.font,
                    request.font_size
                );
                SyncOutcome::Regenerated(id)
            }
            None => {
                let id = arena.insert(mesh, request.transform());
                self.mesh = Some(id);
                tracing::info!("text mesh created in slot {:?}", id);
                SyncOutcome::Created(id)
            }
        };
        self.key = Some(key);
        self.font_width = request.font_width;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::BlockFontLoader;
    use crate::registry::DEFAULT_FONT;
    use endless_common::Color;
    use endless_scene::Scene;

    fn provider() -> TextMeshProvider<BlockFontLoader> {
        TextMeshProvider::new(FontRegistry::builtin("fonts"), BlockFontLoader)
    }

    fn request() -> TextRequest {
        TextRequest {
            text: "ENDLESS".into(),
            font: DEFAULT_FONT.into(),
            font_size: 33.0,
            font_width: 0.2,
        }
    }

    #[test]
    fn first_sync_creates_scaled_mesh() {
        let mut arena = MeshArena::new();
        let mut p = provider();
        let outcome = p.sync(&request(), &mut arena).unwrap();
        let SyncOutcome::Created(id) = outcome else {
            panic!("expected Created, got {outcome:?}");
        };
        let slot = arena.get(id).unwrap();
        assert_eq!(slot.transform.scale, Vec3::new(0.2, 1.0, 1.0));
        assert_eq!(slot.transform.position, Vec3::ZERO);
        assert_eq!(p.regenerations(), 1);
    }

    #[test]
    fn width_change_only_rescales() {
        let mut arena = MeshArena::new();
        let mut p = provider();
        let id = p.sync(&request(), &mut arena).unwrap().mesh();
        let revision = arena.get(id).unwrap().revision;

        let mut req = request();
        req.font_width = 0.7;
        assert_eq!(p.sync(&req, &mut arena).unwrap(), SyncOutcome::Rescaled(id));
        assert_eq!(p.regenerations(), 1);
        let slot = arena.get(id).unwrap();
        assert_eq!(slot.revision, revision);
        assert_eq!(slot.transform.scale.x, 0.7);

        assert_eq!(p.sync(&req, &mut arena).unwrap(), SyncOutcome::Unchanged(id));
    }

    #[test]
    fn font_and_size_changes_regenerate_in_place() {
        let mut arena = MeshArena::new();
        let mut p = provider();
        let id = p.sync(&request(), &mut arena).unwrap().mesh();
        let mut primary = Scene::new("primary", Color::BLACK);
        let mut secondary = Scene::new("secondary", Color::BLACK);
        primary.add(id);
        secondary.add(id);

        let mut req = request();
        req.font = "Monoton".into();
        assert_eq!(p.sync(&req, &mut arena).unwrap(), SyncOutcome::Regenerated(id));
        req.font_size = 80.0;
        assert_eq!(p.sync(&req, &mut arena).unwrap(), SyncOutcome::Regenerated(id));
        req.text = "AGAIN".into();
        assert_eq!(p.sync(&req, &mut arena).unwrap(), SyncOutcome::Regenerated(id));

        assert_eq!(p.regenerations(), 4);
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(id).unwrap().revision, 4);
        assert!(primary.contains(id) && secondary.contains(id));
        assert!(primary.validate(&arena).is_ok() && secondary.validate(&arena).is_ok());
    }

    #[test]
    fn unknown_font_fails_before_generation() {
        let mut arena = MeshArena::new();
        let mut p = provider();
        let mut req = request();
        req.font = "NonexistentFont".into();
        assert!(matches!(
            p.sync(&req, &mut arena),
            Err(FontError::UnknownFont(name)) if name == "NonexistentFont"
        ));
        assert!(arena.is_empty());
        assert_eq!(p.regenerations(), 0);

        let id = p.sync(&request(), &mut arena).unwrap().mesh();
        let revision = arena.get(id).unwrap().revision;
        assert!(p.sync(&req, &mut arena).is_err());
        assert_eq!(arena.get(id).unwrap().revision, revision);
    }

    #[test]
    fn request_from_params() {
        let mut params =
            ParamStore::with_defaults(FontRegistry::builtin("fonts").names(), DEFAULT_FONT)
                .unwrap();
        params.set_number(names::FONT_SIZE, 12.0).unwrap();
        let req = TextRequest::from_params("ENDLESS", &params).unwrap();
        assert_eq!(req.font, DEFAULT_FONT);
        assert_eq!(req.font_size, 12.0);
        assert_eq!(req.font_width, 0.2);
    }

    #[test]
    fn fresh_arena_gets_a_new_slot() {
        let mut p = provider();
        p.sync(&request(), &mut MeshArena::new()).unwrap();
        let mut fresh = MeshArena::new();
        assert!(matches!(
            p.sync(&request(), &mut fresh).unwrap(),
            SyncOutcome::Created(_)
        ));
        assert_eq!(fresh.len(), 1);
    }
}
