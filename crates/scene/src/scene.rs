use crate::arena::{MeshArena, MeshId, MeshSlot};
use crate::error::SceneError;
use endless_common::Color;

/// Non-owning reference from a scene to an arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneNode {
    pub mesh: MeshId,
    pub visible: bool,
}

/// A flat scene graph: a clear color plus the meshes drawn over it.
#[derive(Debug, Clone)]
pub struct Scene {
    label: String,
    pub background: Color,
    nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new(label: impl Into<String>, background: Color) -> Self {
        Self {
            label: label.into(),
            background,
            nodes: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Add a mesh as a visible child. Adding the same mesh twice is a no-op.
    pub fn add(&mut self, mesh: MeshId) {
        if !self.contains(mesh) {
            self.nodes.push(SceneNode {
                mesh,
                visible: true,
            });
        }
    }

    pub fn contains(&self, mesh: MeshId) -> bool {
        self.nodes.iter().any(|n| n.mesh == mesh)
    }

    /// Hide or show a child without dropping its membership.
    pub fn set_visible(&mut self, mesh: MeshId, visible: bool) -> bool {
        match self.nodes.iter_mut().find(|n| n.mesh == mesh) {
            Some(node) => {
                node.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// Visible children resolved against the arena, in insertion order.
    pub fn visible<'a>(
        &'a self,
        arena: &'a MeshArena,
    ) -> impl Iterator<Item = Result<(MeshId, &'a MeshSlot), SceneError>> + 'a {
        self.nodes.iter().filter(|n| n.visible).map(move |n| {
            arena
                .get(n.mesh)
                .map(|slot| (n.mesh, slot))
                .ok_or(SceneError::MissingMesh(n.mesh))
        })
    }

    /// Check that every child still resolves to a live slot.
    pub fn validate(&self, arena: &MeshArena) -> Result<(), SceneError> {
        match self.nodes.iter().find(|n| !arena.contains(n.mesh)) {
            Some(n) => Err(SceneError::MissingMesh(n.mesh)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, Mesh, TextMaterial, GlyphAtlas};
    use endless_common::Transform;

    fn text_mesh() -> Mesh {
        Mesh {
            vertices: Vec::new(),
            indices: Vec::new(),
            material: Material::Text(TextMaterial {
                color: Color::WHITE,
                atlas: GlyphAtlas::default(),
            }),
        }
    }

    #[test]
    fn one_mesh_in_two_scenes() {
        let mut arena = MeshArena::new();
        let id = arena.insert(text_mesh(), Transform::default());
        let mut primary = Scene::new("primary", Color::BLACK);
        let mut secondary = Scene::new("secondary", Color::BLACK);
        primary.add(id);
        secondary.add(id);
        primary.add(id);

        assert_eq!(primary.nodes().len(), 1);
        assert!(primary.contains(id) && secondary.contains(id));
        assert_eq!(arena.len(), 1);

        arena.replace(id, text_mesh()).unwrap();
        assert!(primary.contains(id) && secondary.contains(id));
        assert!(primary.validate(&arena).is_ok());
    }

    #[test]
    fn hidden_nodes_keep_membership() {
        let mut arena = MeshArena::new();
        let id = arena.insert(text_mesh(), Transform::default());
        let mut scene = Scene::new("primary", Color::BLACK);
        scene.add(id);
        assert!(scene.set_visible(id, false));
        assert!(scene.contains(id));
        assert_eq!(scene.visible(&arena).count(), 0);
        assert!(!scene.set_visible(MeshId(9), false));
    }

    #[test]
    fn dangling_child_fails_validation() {
        let mut arena = MeshArena::new();
        let id = arena.insert(text_mesh(), Transform::default());
        let mut scene = Scene::new("secondary", Color::BLACK);
        scene.add(id);
        assert!(scene.validate(&arena).is_ok());

        // Same id, but resolved against an arena that never held it.
        let other = MeshArena::new();
        assert_eq!(scene.validate(&other), Err(SceneError::MissingMesh(id)));
        let first = scene.visible(&other).next().unwrap();
        assert!(first.is_err());
    }
}
