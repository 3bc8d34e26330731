use crate::shaders;
use bytemuck::{Pod, Zeroable};
use endless_common::Color;
use endless_render::{RenderBackend, RenderError, RenderTarget};
use endless_scene::{
    GlyphAtlas, Material, MeshArena, MeshId, MeshSlot, PerspectiveCamera, Scene, TargetId,
    Vertex,
};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
    time: f32,
    _pad: [f32; 3],
}

/// Uniform buffer for one draw. Writes land before the encoder runs, so
/// every draw in a frame needs its own.
struct DrawSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct GpuTarget {
    generation: u64,
    color: wgpu::TextureView,
    depth: wgpu::TextureView,
    /// Binds `color` for sampling from the knot shader.
    sample_group: wgpu::BindGroup,
}

struct GpuMesh {
    revision: u64,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    /// Glyph atlas binding, text meshes only.
    atlas_group: Option<wgpu::BindGroup>,
}

#[derive(Clone, Copy)]
enum Pipeline {
    Knot(TargetId),
    Text,
}

struct PreparedDraw {
    mesh: MeshId,
    slot: usize,
    pipeline: Pipeline,
}

/// wgpu-backed renderer for the sketch.
///
/// Owns pipelines plus the GPU copies of render targets and meshes. Meshes
/// are re-uploaded when their arena revision changes; targets when their
/// generation changes.
pub struct WgpuRenderer {
    knot_pipeline: wgpu::RenderPipeline,
    text_pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    repeat_sampler: wgpu::Sampler,
    clamp_sampler: wgpu::Sampler,
    targets: HashMap<TargetId, GpuTarget>,
    meshes: HashMap<MeshId, GpuMesh>,
    draw_slots: Vec<DrawSlot>,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_uniform_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let knot_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("knot_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::KNOT_SHADER.into()),
        });
        let knot_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &knot_shader,
            ("knot_pipeline", "vs_knot", "fs_knot"),
            surface_format,
            wgpu::BlendState::REPLACE,
            Some(wgpu::Face::Back),
        );

        let text_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("text_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::TEXT_SHADER.into()),
        });
        let text_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &text_shader,
            ("text_pipeline", "vs_text", "fs_text"),
            surface_format,
            wgpu::BlendState::ALPHA_BLENDING,
            None,
        );

        let repeat_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("repeat_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let clamp_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("atlas_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            knot_pipeline,
            text_pipeline,
            uniform_layout,
            texture_layout,
            repeat_sampler,
            clamp_sampler,
            targets: HashMap::new(),
            meshes: HashMap::new(),
            draw_slots: Vec::new(),
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Start recording a frame that ends up in `view`.
    ///
    /// Drive it through [`RenderBackend`], then call [`WgpuFrame::submit`].
    pub fn begin_frame<'a>(
        &'a mut self,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        view: &'a wgpu::TextureView,
    ) -> WgpuFrame<'a> {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("sketch_encoder"),
        });
        WgpuFrame {
            renderer: self,
            device,
            queue,
            view,
            encoder,
            destination: None,
            next_slot: 0,
        }
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        (label, vs, fs): (&str, &str, &str),
        format: wgpu::TextureFormat,
        blend: wgpu::BlendState,
        cull_mode: Option<wgpu::Face>,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some(vs),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Float32x2,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(fs),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }

    fn ensure_target(&mut self, device: &wgpu::Device, target: &RenderTarget) {
        if self
            .targets
            .get(&target.id)
            .is_some_and(|t| t.generation == target.generation)
        {
            return;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen_target"),
            size: wgpu::Extent3d {
                width: target.width.max(1),
                height: target.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.surface_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let color = texture.create_view(&Default::default());
        let sample_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("offscreen_sample_group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.repeat_sampler),
                },
            ],
        });
        tracing::debug!(
            "GPU target {:?} created at {}x{} (generation {})",
            target.id,
            target.width,
            target.height,
            target.generation
        );
        self.targets.insert(
            target.id,
            GpuTarget {
                generation: target.generation,
                color,
                depth: Self::create_depth_texture(device, target.width, target.height),
                sample_group,
            },
        );
    }

    fn ensure_mesh(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: MeshId,
        slot: &MeshSlot,
    ) {
        if self
            .meshes
            .get(&id)
            .is_some_and(|m| m.revision == slot.revision)
        {
            return;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertex_buffer"),
            contents: bytemuck::cast_slice(&slot.mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_index_buffer"),
            contents: bytemuck::cast_slice(&slot.mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let atlas_group = match &slot.mesh.material {
            Material::Text(text) => Some(self.upload_atlas(device, queue, &text.atlas)),
            Material::Knot(_) => None,
        };
        tracing::debug!(
            "uploaded mesh {:?} revision {} ({} triangles)",
            id,
            slot.revision,
            slot.mesh.triangle_count()
        );
        self.meshes.insert(
            id,
            GpuMesh {
                revision: slot.revision,
                vertex_buffer,
                index_buffer,
                index_count: slot.mesh.indices.len() as u32,
                atlas_group,
            },
        );
    }

    fn upload_atlas(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        atlas: &GlyphAtlas,
    ) -> wgpu::BindGroup {
        let blank = [0u8];
        let limit = device.limits().max_texture_dimension_2d;
        let (width, height, pixels) = if atlas.width == 0 || atlas.height == 0 {
            (1, 1, &blank[..])
        } else if atlas.width > limit || atlas.height > limit {
            tracing::warn!(
                "glyph atlas {}x{} exceeds device limit {limit}, drawing blank",
                atlas.width,
                atlas.height
            );
            (1, 1, &blank[..])
        } else {
            (atlas.width, atlas.height, &atlas.pixels[..])
        };
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("glyph_atlas"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::R8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            pixels,
        );
        let view = texture.create_view(&Default::default());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glyph_atlas_group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.clamp_sampler),
                },
            ],
        })
    }

    fn write_slot(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        index: usize,
        uniforms: &DrawUniforms,
    ) {
        while self.draw_slots.len() <= index {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("draw_uniforms"),
                size: std::mem::size_of::<DrawUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("draw_uniform_group"),
                layout: &self.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            self.draw_slots.push(DrawSlot { buffer, bind_group });
        }
        queue.write_buffer(
            &self.draw_slots[index].buffer,
            0,
            bytemuck::bytes_of(uniforms),
        );
    }
}

/// One frame being recorded by a [`WgpuRenderer`].
///
/// Every pass goes into a single command encoder, so the off-screen pass is
/// guaranteed to complete before the visible pass samples its output.
pub struct WgpuFrame<'a> {
    renderer: &'a mut WgpuRenderer,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    view: &'a wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    destination: Option<TargetId>,
    next_slot: usize,
}

impl WgpuFrame<'_> {
    /// Finish recording and hand the passes to the GPU.
    pub fn submit(self) {
        self.queue.submit(std::iter::once(self.encoder.finish()));
    }
}

fn clear_color(color: Color) -> wgpu::Color {
    wgpu::Color {
        r: color.r as f64,
        g: color.g as f64,
        b: color.b as f64,
        a: color.a as f64,
    }
}

impl RenderBackend for WgpuFrame<'_> {
    fn set_render_target(&mut self, target: Option<&RenderTarget>) -> Result<(), RenderError> {
        if let Some(t) = target {
            self.renderer.ensure_target(self.device, t);
        }
        self.destination = target.map(|t| t.id);
        Ok(())
    }

    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        arena: &MeshArena,
    ) -> Result<(), RenderError> {
        let view_proj = camera.view_projection().to_cols_array_2d();
        let mut prepared = Vec::new();

        for entry in scene.visible(arena) {
            let (id, slot) = entry?;
            if slot.mesh.is_empty() {
                continue;
            }
            let (pipeline, color, time) = match &slot.mesh.material {
                Material::Knot(k) => {
                    if Some(k.texture) == self.destination {
                        return Err(RenderError::Feedback(k.texture));
                    }
                    if !self.renderer.targets.contains_key(&k.texture) {
                        return Err(RenderError::Surface(format!(
                            "target {:?} sampled before it was allocated",
                            k.texture
                        )));
                    }
                    (Pipeline::Knot(k.texture), Color::WHITE, k.time)
                }
                Material::Text(t) => (Pipeline::Text, t.color, 0.0),
            };

            self.renderer.ensure_mesh(self.device, self.queue, id, slot);
            let uniforms = DrawUniforms {
                view_proj,
                model: slot.transform.matrix().to_cols_array_2d(),
                color: color.to_array(),
                time,
                _pad: [0.0; 3],
            };
            let index = self.next_slot;
            self.next_slot += 1;
            self.renderer
                .write_slot(self.device, self.queue, index, &uniforms);
            prepared.push(PreparedDraw {
                mesh: id,
                slot: index,
                pipeline,
            });
        }

        let renderer = &*self.renderer;
        let (color_view, depth_view) = match self.destination {
            Some(id) => {
                let target = renderer.targets.get(&id).ok_or_else(|| {
                    RenderError::Surface(format!("target {id:?} bound but never allocated"))
                })?;
                (&target.color, &target.depth)
            }
            None => (self.view, &renderer.depth_texture),
        };

        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(scene.label()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color(scene.background)),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        for item in &prepared {
            let Some(mesh) = renderer.meshes.get(&item.mesh) else {
                continue;
            };
            let texture_group = match item.pipeline {
                Pipeline::Knot(target) => {
                    pass.set_pipeline(&renderer.knot_pipeline);
                    renderer.targets.get(&target).map(|t| &t.sample_group)
                }
                Pipeline::Text => {
                    pass.set_pipeline(&renderer.text_pipeline);
                    mesh.atlas_group.as_ref()
                }
            };
            let Some(texture_group) = texture_group else {
                continue;
            };
            pass.set_bind_group(0, &renderer.draw_slots[item.slot].bind_group, &[]);
            pass.set_bind_group(1, texture_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layout_matches_wgsl() {
        // Two mat4x4, one vec4, then time padded out to 16 bytes.
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 64 + 64 + 16 + 16);
    }

    #[test]
    fn vertex_stride() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn clear_color_converts_channels() {
        let c = clear_color(Color::rgb(1.0, 0.5, 0.0));
        assert_eq!((c.r, c.g, c.b, c.a), (1.0, 0.5, 0.0, 1.0));
    }
}
