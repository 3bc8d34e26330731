/// WGSL shader for the torus knot.
///
/// The vertex stage ripples the tube along its normals over time; the
/// fragment stage tiles the off-screen target across the surface, scrolls it
/// along the tube and darkens the far side.
pub const KNOT_SHADER: &str = r#"
struct DrawUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    color: vec4<f32>,
    time: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

@group(0) @binding(0)
var<uniform> uniforms: DrawUniforms;

@group(1) @binding(0)
var source_texture: texture_2d<f32>;
@group(1) @binding(1)
var source_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct KnotOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) local_z: f32,
};

@vertex
fn vs_knot(vertex: VertexInput) -> KnotOutput {
    let ripple = sin(vertex.uv.x * 48.0 + uniforms.time * 2.0) * 0.4;
    let displaced = vertex.position + vertex.normal * ripple;

    var out: KnotOutput;
    out.clip_position = uniforms.view_proj * uniforms.model * vec4<f32>(displaced, 1.0);
    out.uv = vertex.uv;
    out.local_z = displaced.z;
    return out;
}

@fragment
fn fs_knot(in: KnotOutput) -> @location(0) vec4<f32> {
    let scroll = uniforms.time * 0.4;
    let tiling = -vec2<f32>(12.0, 3.0);
    let uv = fract(in.uv * tiling - vec2<f32>(scroll, 0.0));
    let texel = textureSample(source_texture, source_sampler, uv).rgb;
    let shade = clamp(in.local_z / 5.0, 0.0, 1.0);
    return vec4<f32>(texel * shade, 1.0);
}
"#;

/// WGSL shader for glyph quads: flat color masked by atlas coverage.
pub const TEXT_SHADER: &str = r#"
struct DrawUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    color: vec4<f32>,
    time: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

@group(0) @binding(0)
var<uniform> uniforms: DrawUniforms;

@group(1) @binding(0)
var atlas_texture: texture_2d<f32>;
@group(1) @binding(1)
var atlas_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct TextOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_text(vertex: VertexInput) -> TextOutput {
    var out: TextOutput;
    out.clip_position = uniforms.view_proj * uniforms.model * vec4<f32>(vertex.position, 1.0);
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_text(in: TextOutput) -> @location(0) vec4<f32> {
    let coverage = textureSample(atlas_texture, atlas_sampler, in.uv).r;
    return vec4<f32>(uniforms.color.rgb, uniforms.color.a * coverage);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(source: &str) {
        let module = naga::front::wgsl::parse_str(source).expect("WGSL failed to parse");
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .expect("WGSL failed to validate");
    }

    #[test]
    fn knot_shader_is_valid() {
        validate(KNOT_SHADER);
    }

    #[test]
    fn text_shader_is_valid() {
        validate(TEXT_SHADER);
    }

    #[test]
    fn entry_points_present() {
        for entry in ["fn vs_knot", "fn fs_knot"] {
            assert!(KNOT_SHADER.contains(entry));
        }
        for entry in ["fn vs_text", "fn fs_text"] {
            assert!(TEXT_SHADER.contains(entry));
        }
    }
}
