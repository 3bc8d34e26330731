use crate::Mesh;
use crate::error::SceneError;
use endless_common::Transform;

/// Index of a slot in a [`MeshArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

/// One mesh plus its placement.
#[derive(Debug, Clone)]
pub struct MeshSlot {
    pub mesh: Mesh,
    pub transform: Transform,
    /// Bumped whenever `mesh` is replaced. Backends key GPU uploads on it.
    pub revision: u64,
}

/// Owner of every mesh in the sketch.
///
/// Scenes reference slots by [`MeshId`]; the arena is the only owner.
/// Slots are never freed, so an id stays valid for the arena's lifetime.
#[derive(Debug, Clone, Default)]
pub struct MeshArena {
    slots: Vec<MeshSlot>,
}

impl MeshArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mesh: Mesh, transform: Transform) -> MeshId {
        let id = MeshId(self.slots.len() as u32);
        tracing::debug!(
            "mesh {:?} inserted ({} triangles)",
            id,
            mesh.triangle_count()
        );
        self.slots.push(MeshSlot {
            mesh,
            transform,
            revision: 1,
        });
        id
    }

    pub fn get(&self, id: MeshId) -> Option<&MeshSlot> {
        self.slots.get(id.0 as usize)
    }

    pub fn contains(&self, id: MeshId) -> bool {
        self.get(id).is_some()
    }

    /// Swap in new geometry and material, keeping the slot id.
    pub fn replace(&mut self, id: MeshId, mesh: Mesh) -> Result<(), SceneError> {
        let slot = self.slot_mut(id)?;
        slot.mesh = mesh;
        slot.revision += 1;
        Ok(())
    }

    pub fn set_transform(&mut self, id: MeshId, transform: Transform) -> Result<(), SceneError> {
        self.slot_mut(id)?.transform = transform;
        Ok(())
    }

    /// Mutable material access for per-frame uniform edits.
    ///
    /// Does not bump the slot revision; replace the mesh to change textures.
    pub fn material_mut(&mut self, id: MeshId) -> Result<&mut crate::Material, SceneError> {
        Ok(&mut self.slot_mut(id)?.mesh.material)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot_mut(&mut self, id: MeshId) -> Result<&mut MeshSlot, SceneError> {
        self.slots
            .get_mut(id.0 as usize)
            .ok_or(SceneError::MissingMesh(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KnotMaterial, Material, TargetId, Vertex};

    fn tri() -> Mesh {
        let v = Vertex {
            position: [0.0; 3],
            normal: [0.0, 0.0, 1.0],
            uv: [0.0; 2],
        };
        Mesh {
            vertices: vec![v; 3],
            indices: vec![0, 1, 2],
            material: Material::Knot(KnotMaterial::new(TargetId(0))),
        }
    }

    #[test]
    fn replace_keeps_id_and_bumps_revision() {
        let mut arena = MeshArena::new();
        let id = arena.insert(tri(), Transform::default());
        assert_eq!(arena.get(id).unwrap().revision, 1);

        let mut bigger = tri();
        bigger.indices.extend([0, 2, 1]);
        arena.replace(id, bigger).unwrap();
        let slot = arena.get(id).unwrap();
        assert_eq!(slot.revision, 2);
        assert_eq!(slot.mesh.triangle_count(), 2);
    }

    #[test]
    fn transform_and_uniform_edits_keep_revision() {
        let mut arena = MeshArena::new();
        let id = arena.insert(tri(), Transform::default());
        arena
            .set_transform(id, Transform::from_scale(glam::Vec3::new(0.5, 1.0, 1.0)))
            .unwrap();
        if let Material::Knot(k) = arena.material_mut(id).unwrap() {
            k.time = 3.0;
        }
        let slot = arena.get(id).unwrap();
        assert_eq!(slot.revision, 1);
        assert_eq!(slot.transform.scale.x, 0.5);
        assert_eq!(slot.mesh.material, Material::Knot(KnotMaterial {
            time: 3.0,
            texture: TargetId(0)
        }));
    }

    #[test]
    fn foreign_id_is_missing() {
        let mut arena = MeshArena::new();
        let a = arena.insert(tri(), Transform::default());
        let stranger = MeshId(a.0 + 1);
        assert!(arena.contains(a));
        assert!(!arena.contains(stranger));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.replace(stranger, tri()), Err(SceneError::MissingMesh(stranger)));
        assert_eq!(
            arena.set_transform(stranger, Transform::default()),
            Err(SceneError::MissingMesh(stranger))
        );
    }
}
