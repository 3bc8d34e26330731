use crate::backend::RenderBackend;
use crate::clock::Clock;
use crate::error::RenderError;
use crate::offscreen::OffscreenTarget;
use crate::target::ResizePolicy;
use endless_common::{Color, Transform, Viewport};
use endless_params::{ParamStore, names};
use endless_scene::geometry::TorusKnot;
use endless_scene::{
    KnotMaterial, Material, Mesh, MeshArena, MeshId, PerspectiveCamera, Scene, SceneError,
    TargetId,
};

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Zero-based index of the frame just rendered.
    pub frame: u64,
    /// Time uniform handed to the knot shader, in seconds.
    pub time: f32,
    /// Off-screen camera distance used for the frame.
    pub camera_z: f32,
    pub target: Viewport,
}

/// Per-frame orchestration of the two passes.
pub struct CompositeLoop<C: Clock> {
    clock: C,
    policy: ResizePolicy,
    viewport: Viewport,
    arena: MeshArena,
    offscreen: OffscreenTarget,
    primary: Scene,
    camera: PerspectiveCamera,
    knot: MeshId,
    time: f32,
    frame: u64,
}

impl<C: Clock> CompositeLoop<C> {
    /// Allocate the off-screen target and build the visible scene: a torus
    /// knot whose material samples that target.
    pub fn new(clock: C, viewport: Viewport, policy: ResizePolicy) -> Self {
        let offscreen = OffscreenTarget::new(TargetId(0), viewport);
        let mut arena = MeshArena::new();

        let (vertices, indices) = TorusKnot::default().build();
        let knot = arena.insert(
            Mesh {
                vertices,
                indices,
                material: Material::Knot(KnotMaterial::new(offscreen.texture())),
            },
            Transform::default(),
        );

        let mut primary = Scene::new("primary", Color::BLACK);
        primary.add(knot);

        tracing::info!(
            "composite loop mounted at {}x{} (resize: {})",
            viewport.width,
            viewport.height,
            policy
        );

        Self {
            clock,
            policy,
            viewport,
            arena,
            offscreen,
            primary,
            camera: PerspectiveCamera::primary(viewport.aspect()),
            knot,
            time: 0.0,
            frame: 0,
        }
    }

    /// Add a mesh to both scenes. It is always drawn off-screen; on screen
    /// only when `on_screen` is set.
    pub fn attach_shared(&mut self, mesh: MeshId, on_screen: bool) {
        self.offscreen.scene.add(mesh);
        self.primary.add(mesh);
        self.primary.set_visible(mesh, on_screen);
    }

    /// Check that every child of both scenes resolves in the arena.
    pub fn validate(&self) -> Result<(), SceneError> {
        self.offscreen.scene.validate(&self.arena)?;
        self.primary.validate(&self.arena)
    }

    /// Follow a viewport change according to the resize policy.
    ///
    /// Returns whether the render target was reallocated.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        match self.policy {
            ResizePolicy::Fixed => {
                tracing::debug!(
                    "resize to {}x{} ignored (fixed policy)",
                    viewport.width,
                    viewport.height
                );
                false
            }
            ResizePolicy::Track => {
                self.viewport = viewport;
                self.camera.aspect = viewport.aspect();
                self.offscreen.resize(viewport)
            }
        }
    }

    /// Render one frame: off-screen pass, then the visible pass.
    pub fn frame<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        params: &ParamStore,
    ) -> Result<FrameReport, RenderError> {
        let camera_z = params.get_number(names::CAMERA_Z)?;
        self.offscreen.camera.set_distance(camera_z);

        self.time = self.time.max(self.clock.elapsed().as_secs_f32());
        if let Material::Knot(k) = self.arena.material_mut(self.knot)? {
            k.time = self.time;
        }

        backend.set_render_target(Some(&self.offscreen.target))?;
        backend.render(&self.offscreen.scene, &self.offscreen.camera, &self.arena)?;
        backend.set_render_target(None)?;
        backend.render(&self.primary, &self.camera, &self.arena)?;

        let report = FrameReport {
            frame: self.frame,
            time: self.time,
            camera_z,
            target: self.offscreen.target.size(),
        };
        self.frame += 1;
        Ok(report)
    }

    pub fn arena(&self) -> &MeshArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut MeshArena {
        &mut self.arena
    }

    pub fn offscreen(&self) -> &OffscreenTarget {
        &self.offscreen
    }

    pub fn primary(&self) -> &Scene {
        &self.primary
    }

    pub fn primary_camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn knot(&self) -> MeshId {
        self.knot
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn policy(&self) -> ResizePolicy {
        self.policy
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::debug::{BackendCall, DebugBackend};
    use std::time::Duration;

    fn params() -> ParamStore {
        ParamStore::with_defaults(vec!["Orbitron".into()], "Orbitron").unwrap()
    }

    fn mounted(policy: ResizePolicy) -> (CompositeLoop<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let composite = CompositeLoop::new(clock.clone(), Viewport::new(1280, 720), policy);
        (composite, clock)
    }

    #[test]
    fn offscreen_pass_precedes_primary_pass() {
        let (mut composite, _) = mounted(ResizePolicy::Track);
        let mut backend = DebugBackend::new();
        composite.frame(&mut backend, &params()).unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 4);
        assert!(matches!(&calls[0], BackendCall::SetTarget(Some(t)) if t.id == TargetId(0)));
        assert!(matches!(&calls[1], BackendCall::Draw(d) if d.destination == Some(TargetId(0))));
        assert!(matches!(&calls[2], BackendCall::SetTarget(None)));
        assert!(matches!(&calls[3], BackendCall::Draw(d) if d.destination.is_none()));
    }

    #[test]
    fn camera_distance_tracks_parameter() {
        let (mut composite, _) = mounted(ResizePolicy::Track);
        let mut backend = DebugBackend::new();
        let mut params = params();
        for z in 1..=100 {
            params.set_number(names::CAMERA_Z, z as f32).unwrap();
            let report = composite.frame(&mut backend, &params).unwrap();
            assert_eq!(report.camera_z, z as f32);
            assert_eq!(composite.offscreen().camera.distance(), z as f32);
        }
    }

    #[test]
    fn time_uniform_follows_clock_and_never_decreases() {
        let (mut composite, clock) = mounted(ResizePolicy::Track);
        let mut backend = DebugBackend::new();
        let params = params();

        clock.set(Duration::from_secs(2));
        assert_eq!(composite.frame(&mut backend, &params).unwrap().time, 2.0);
        clock.set(Duration::from_secs(1));
        assert_eq!(composite.frame(&mut backend, &params).unwrap().time, 2.0);
        clock.advance(Duration::from_secs(2));
        assert_eq!(composite.frame(&mut backend, &params).unwrap().time, 3.0);

        let primary_times: Vec<_> = backend
            .draws()
            .filter(|d| d.destination.is_none())
            .map(|d| d.time)
            .collect();
        assert_eq!(primary_times, vec![Some(2.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn knot_samples_the_offscreen_target() {
        let (mut composite, _) = mounted(ResizePolicy::Track);
        let mut backend = DebugBackend::new();
        composite.frame(&mut backend, &params()).unwrap();
        let primary = backend.draws().find(|d| d.destination.is_none()).unwrap();
        assert_eq!(primary.sampled, vec![composite.offscreen().texture()]);
        assert!(primary.meshes.contains(&composite.knot()));
    }

    #[test]
    fn track_policy_follows_resize() {
        let (mut composite, _) = mounted(ResizePolicy::Track);
        assert!(composite.resize(Viewport::new(800, 800)));
        assert_eq!(composite.offscreen().target.size(), Viewport::new(800, 800));
        assert_eq!(composite.offscreen().target.generation, 2);
        assert_eq!(composite.primary_camera().aspect, 1.0);
        assert!(!composite.resize(Viewport::new(800, 800)));
        assert!(composite.resize(Viewport::new(0, 0)));
        assert_eq!(composite.offscreen().target.size(), Viewport::new(1, 1));
    }

    #[test]
    fn fixed_policy_keeps_mount_size() {
        let (mut composite, _) = mounted(ResizePolicy::Fixed);
        assert!(!composite.resize(Viewport::new(800, 800)));
        assert_eq!(composite.offscreen().target.size(), Viewport::new(1280, 720));
        assert_eq!(composite.offscreen().target.generation, 1);
        assert_eq!(composite.primary_camera().aspect, 1280.0 / 720.0);
        assert_eq!(composite.viewport(), Viewport::new(1280, 720));
    }

    #[test]
    fn context_loss_is_surfaced() {
        let (mut composite, _) = mounted(ResizePolicy::Track);
        let mut backend = DebugBackend::new();
        backend.lose_context();
        assert!(matches!(
            composite.frame(&mut backend, &params()),
            Err(RenderError::ContextLost)
        ));
        assert_eq!(composite.frames(), 0);
    }

    #[test]
    fn foreign_mesh_fails_validation() {
        let (mut composite, _) = mounted(ResizePolicy::Track);
        assert!(composite.validate().is_ok());
        let stranger = MeshId(composite.knot().0 + 100);
        composite.attach_shared(stranger, true);
        assert_eq!(composite.validate(), Err(SceneError::MissingMesh(stranger)));
    }

    #[test]
    fn attached_mesh_hidden_on_screen() {
        let (mut composite, _) = mounted(ResizePolicy::Track);
        let knot = composite.knot();
        let slot = composite.arena().get(knot).unwrap().clone();
        let extra = composite
            .arena_mut()
            .insert(slot.mesh, Transform::default());
        composite.attach_shared(extra, false);
        assert!(composite.validate().is_ok());
        assert!(composite.offscreen().scene.contains(extra));
        assert!(composite.primary().contains(extra));
        let visible: Vec<_> = composite
            .primary()
            .visible(composite.arena())
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(visible, vec![knot]);
    }
}
