use crate::backend::RenderBackend;
use crate::error::RenderError;
use crate::target::RenderTarget;
use endless_scene::{Material, MeshArena, MeshId, PerspectiveCamera, Scene, TargetId};
use std::collections::BTreeMap;
use std::fmt::Write;

/// One recorded draw of a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub scene: String,
    /// `None` is the visible framebuffer.
    pub destination: Option<TargetId>,
    pub camera_z: f32,
    pub meshes: Vec<MeshId>,
    pub triangles: usize,
    /// Targets sampled by the drawn materials.
    pub sampled: Vec<TargetId>,
    /// Time uniform of the drawn knot materials, if any.
    pub time: Option<f32>,
}

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    SetTarget(Option<RenderTarget>),
    Draw(DrawCall),
}

#[derive(Debug, Clone, Copy, Default)]
struct TargetState {
    generation: u64,
    triangles: usize,
}

/// Backend that records calls instead of drawing.
///
/// Tracks how many triangles have landed in each target so tests can tell a
/// written target from an empty one, and rejects draws that would sample the
/// target currently being written.
#[derive(Debug, Default)]
pub struct DebugBackend {
    calls: Vec<BackendCall>,
    destination: Option<TargetId>,
    targets: BTreeMap<TargetId, TargetState>,
    lost: bool,
}

impl DebugBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter().filter_map(|c| match c {
            BackendCall::Draw(d) => Some(d),
            BackendCall::SetTarget(_) => None,
        })
    }

    /// Drop the recorded calls; target contents are kept.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Triangles drawn into `target` since it was last (re)allocated.
    pub fn target_triangles(&self, target: TargetId) -> usize {
        self.targets.get(&target).map_or(0, |t| t.triangles)
    }

    /// Whether `target` has been bound at least once, so sampling it is valid.
    pub fn knows_target(&self, target: TargetId) -> bool {
        self.targets.contains_key(&target)
    }

    pub fn target_generation(&self, target: TargetId) -> Option<u64> {
        self.targets.get(&target).map(|t| t.generation)
    }

    /// Make every later call fail as a lost GPU context would.
    pub fn lose_context(&mut self) {
        self.lost = true;
    }

    /// Human-readable transcript of the recorded calls.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for call in &self.calls {
            match call {
                BackendCall::SetTarget(Some(t)) => {
                    let _ = writeln!(
                        out,
                        "bind target {} ({}x{}, gen {})",
                        t.id.0, t.width, t.height, t.generation
                    );
                }
                BackendCall::SetTarget(None) => {
                    let _ = writeln!(out, "bind framebuffer");
                }
                BackendCall::Draw(d) => {
                    let _ = write!(
                        out,
                        "  draw {} camera_z={:.1} meshes={} triangles={}",
                        d.scene,
                        d.camera_z,
                        d.meshes.len(),
                        d.triangles
                    );
                    if let Some(t) = d.time {
                        let _ = write!(out, " time={t:.3}");
                    }
                    for s in &d.sampled {
                        let _ = write!(out, " samples={}", s.0);
                    }
                    out.push('\n');
                }
            }
        }
        out
    }

    fn check_alive(&self) -> Result<(), RenderError> {
        if self.lost {
            Err(RenderError::ContextLost)
        } else {
            Ok(())
        }
    }
}

impl RenderBackend for DebugBackend {
    fn set_render_target(&mut self, target: Option<&RenderTarget>) -> Result<(), RenderError> {
        self.check_alive()?;
        if let Some(t) = target {
            let state = self.targets.entry(t.id).or_default();
            if state.generation != t.generation {
                *state = TargetState {
                    generation: t.generation,
                    triangles: 0,
                };
            }
        }
        self.destination = target.map(|t| t.id);
        self.calls.push(BackendCall::SetTarget(target.copied()));
        Ok(())
    }

    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        arena: &MeshArena,
    ) -> Result<(), RenderError> {
        self.check_alive()?;
        let mut draw = DrawCall {
            scene: scene.label().to_string(),
            destination: self.destination,
            camera_z: camera.distance(),
            meshes: Vec::new(),
            triangles: 0,
            sampled: Vec::new(),
            time: None,
        };
        for entry in scene.visible(arena) {
            let (id, slot) = entry?;
            if let Some(sampled) = slot.mesh.material.sampled_target() {
                if Some(sampled) == self.destination {
                    return Err(RenderError::Feedback(sampled));
                }
                draw.sampled.push(sampled);
            }
            if let Material::Knot(k) = &slot.mesh.material {
                draw.time = Some(k.time);
            }
            draw.meshes.push(id);
            draw.triangles += slot.mesh.triangle_count();
        }
        if let Some(dest) = self.destination {
            if let Some(state) = self.targets.get_mut(&dest) {
                // A render clears first, so the target holds only this draw.
                state.triangles = draw.triangles;
            }
        }
        self.calls.push(BackendCall::Draw(draw));
        Ok(())
    }
}
