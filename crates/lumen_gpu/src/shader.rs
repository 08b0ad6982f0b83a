//! WGSL for every Lumen draw
//!
//! One shader serves quads (triangle strip) and tessellated paths (triangle
//! list). The fragment stage evaluates a rounded-rect SDF in untransformed local
//! space when a radius is set, samples the bound texture, and writes
//! premultiplied color.

pub const DRAW_SHADER: &str = r#"
struct Uniforms {
    transform: mat4x4<f32>,
    // device width, device height, dpi scale, flip y
    viewport: vec4<f32>,
    rect: vec4<f32>,
    color: vec4<f32>,
    // use texture, opacity, radius, alpha only
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;
@group(1) @binding(0) var t_image: texture_2d<f32>;
@group(1) @binding(1) var s_image: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) local: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) uv: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    let frame = u.transform * vec4<f32>(position, 0.0, 1.0);
    let device = frame.xy / frame.w * u.viewport.z;
    let ndc = vec2<f32>(
        device.x / u.viewport.x * 2.0 - 1.0,
        1.0 - device.y / u.viewport.y * 2.0,
    );
    out.position = vec4<f32>(ndc, 0.0, 1.0);
    out.uv = uv;
    out.local = position;
    return out;
}

fn rounded_rect_sdf(p: vec2<f32>, rect: vec4<f32>, radius: f32) -> f32 {
    let half = rect.zw * 0.5;
    let center = rect.xy + half;
    let q = abs(p - center) - half + vec2<f32>(radius);
    return length(max(q, vec2<f32>(0.0))) + min(max(q.x, q.y), 0.0) - radius;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(t_image, s_image, in.uv);

    var color = u.color;
    if u.params.x > 0.5 {
        if u.params.w > 0.5 {
            color = vec4<f32>(u.color.rgb, u.color.a * texel.r);
        } else {
            color = texel;
        }
    }

    var coverage = 1.0;
    let radius = min(u.params.z, min(u.rect.z, u.rect.w) * 0.5);
    if radius > 0.0 {
        let d = rounded_rect_sdf(in.local, u.rect, radius);
        coverage = clamp(0.5 - d * u.viewport.z, 0.0, 1.0);
    }

    let alpha = color.a * u.params.y * coverage;
    return vec4<f32>(color.rgb * alpha, alpha);
}
"#;
