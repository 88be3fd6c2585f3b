//! Built-in WGSL sources and the uniform-block layouts that mirror them.
//!
//! The `BlockLayout` tables below are shader ABI: every offset must match
//! the WGSL struct layout of the corresponding source. Host-side uniform
//! names keep the classic `pointLight.position` / `flash_lights[i].field`
//! spelling; WGSL identifiers are free to differ.

use lumen_render::BlockLayout;

pub const MAX_FLASH_LIGHTS: usize = 4;
pub const MAX_SPOT_LIGHTS: usize = 4;

const FLASH_LIGHT_STRIDE: usize = 64;
const SPOT_LIGHT_STRIDE: usize = 48;
const FLASH_ARRAY_OFFSET: usize = 272;
const SPOT_ARRAY_OFFSET: usize = 544;
const PBR_BLOCK_LEN: usize = SPOT_ARRAY_OFFSET + MAX_SPOT_LIGHTS * SPOT_LIGHT_STRIDE;

/// Uniform ABI for the Cook-Torrance pass.
pub fn pbr_block_layout() -> BlockLayout {
    let mut layout = BlockLayout::new(PBR_BLOCK_LEN)
        .field("project", 0, 64)
        .field("view", 64, 64)
        .field("model", 128, 64)
        .field("pointLight.position", 192, 12)
        .field("pointLight.intensity", 204, 4)
        .field("pointLight.color", 208, 12)
        .field("far_plane", 220, 4)
        .field("viewPos", 224, 12)
        .field("metallic", 236, 4)
        .field("albedo", 240, 12)
        .field("roughness", 252, 4)
        .field("ao", 256, 4)
        .field("shadows_enabled", 260, 4)
        .field("pointLight.on", 264, 4)
        .field("num_flash_lights", 268, 4)
        .field("num_spot_lights", 528, 4);
    for i in 0..MAX_FLASH_LIGHTS {
        let base = FLASH_ARRAY_OFFSET + i * FLASH_LIGHT_STRIDE;
        layout = layout
            .field(format!("flash_lights[{i}].position"), base, 12)
            .field(format!("flash_lights[{i}].cut_off"), base + 12, 4)
            .field(format!("flash_lights[{i}].direction"), base + 16, 12)
            .field(format!("flash_lights[{i}].outer_cut_off"), base + 28, 4)
            .field(format!("flash_lights[{i}].color"), base + 32, 12)
            .field(format!("flash_lights[{i}].constant"), base + 44, 4)
            .field(format!("flash_lights[{i}].linear"), base + 48, 4)
            .field(format!("flash_lights[{i}].quadratic"), base + 52, 4)
            .field(format!("flash_lights[{i}].on"), base + 56, 4);
    }
    for i in 0..MAX_SPOT_LIGHTS {
        let base = SPOT_ARRAY_OFFSET + i * SPOT_LIGHT_STRIDE;
        layout = layout
            .field(format!("spot_lights[{i}].position"), base, 12)
            .field(format!("spot_lights[{i}].constant"), base + 12, 4)
            .field(format!("spot_lights[{i}].color"), base + 16, 12)
            .field(format!("spot_lights[{i}].linear"), base + 28, 4)
            .field(format!("spot_lights[{i}].quadratic"), base + 32, 4);
    }
    layout
}

/// Uniform ABI for the skybox pass.
pub fn skybox_block_layout() -> BlockLayout {
    BlockLayout::new(128).field("project", 0, 64).field("view", 64, 64)
}

/// Uniform ABI for the light gizmo pass.
pub fn gizmo_block_layout() -> BlockLayout {
    BlockLayout::new(208)
        .field("project", 0, 64)
        .field("view", 64, 64)
        .field("model", 128, 64)
        .field("lightColor", 192, 12)
}

/// Uniform ABI for the shadow depth pass.
pub fn shadow_block_layout() -> BlockLayout {
    BlockLayout::new(144)
        .field("model", 0, 64)
        .field("shadow_matrix", 64, 64)
        .field("lightPos", 128, 12)
        .field("far_plane", 140, 4)
}

/// Uniform ABI for the shadow blur pass.
pub fn blur_block_layout() -> BlockLayout {
    BlockLayout::new(16)
        .field("face_index", 0, 4)
        .field("texel", 4, 4)
}

/// Cook-Torrance PBR with point/flash/spot lights and optional cubemap
/// shadowing.
pub const PBR_SHADER: &str = r#"
struct FlashLight {
    position: vec3<f32>,
    cut_off: f32,
    direction: vec3<f32>,
    outer_cut_off: f32,
    color: vec3<f32>,
    att_constant: f32,
    att_linear: f32,
    att_quadratic: f32,
    enabled: u32,
    _pad: f32,
};

struct SpotLight {
    position: vec3<f32>,
    att_constant: f32,
    color: vec3<f32>,
    att_linear: f32,
    att_quadratic: f32,
    _p0: f32,
    _p1: f32,
    _p2: f32,
};

struct SceneUniforms {
    project: mat4x4<f32>,
    view: mat4x4<f32>,
    model: mat4x4<f32>,
    point_position: vec3<f32>,
    point_intensity: f32,
    point_color: vec3<f32>,
    far_plane: f32,
    view_pos: vec3<f32>,
    metallic: f32,
    albedo: vec3<f32>,
    roughness: f32,
    ao: f32,
    shadows_enabled: u32,
    point_on: u32,
    num_flash_lights: u32,
    flash_lights: array<FlashLight, 4>,
    num_spot_lights: u32,
    _q0: f32,
    _q1: f32,
    _q2: f32,
    spot_lights: array<SpotLight, 4>,
};

@group(0) @binding(0)
var<uniform> u: SceneUniforms;

@group(1) @binding(0) var t_diffuse1: texture_2d<f32>;
@group(1) @binding(1) var t_specular1: texture_2d<f32>;
@group(1) @binding(2) var t_normals1: texture_2d<f32>;
@group(1) @binding(3) var t_emissive1: texture_2d<f32>;
@group(1) @binding(4) var s_material: sampler;

@group(2) @binding(0) var t_shadow: texture_depth_cube;
@group(2) @binding(1) var s_shadow: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tex_coords: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tex_coords: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = u.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = u.project * u.view * world;
    out.world_pos = world.xyz;
    out.normal = normalize((u.model * vec4<f32>(in.normal, 0.0)).xyz);
    out.tex_coords = in.tex_coords;
    return out;
}

const PI: f32 = 3.14159265359;

fn distribution_ggx(n: vec3<f32>, h: vec3<f32>, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let n_dot_h = max(dot(n, h), 0.0);
    var denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    denom = PI * denom * denom;
    return a2 / max(denom, 1e-5);
}

fn geometry_schlick_ggx(n_dot_v: f32, roughness: f32) -> f32 {
    let r = roughness + 1.0;
    let k = (r * r) / 8.0;
    return n_dot_v / (n_dot_v * (1.0 - k) + k);
}

fn geometry_smith(n: vec3<f32>, v: vec3<f32>, l: vec3<f32>, roughness: f32) -> f32 {
    let ggx_v = geometry_schlick_ggx(max(dot(n, v), 0.0), roughness);
    let ggx_l = geometry_schlick_ggx(max(dot(n, l), 0.0), roughness);
    return ggx_v * ggx_l;
}

fn fresnel_schlick(cos_theta: f32, f0: vec3<f32>) -> vec3<f32> {
    return f0 + (vec3<f32>(1.0) - f0) * pow(clamp(1.0 - cos_theta, 0.0, 1.0), 5.0);
}

fn cook_torrance(
    n: vec3<f32>,
    v: vec3<f32>,
    l: vec3<f32>,
    radiance: vec3<f32>,
    base_color: vec3<f32>,
) -> vec3<f32> {
    let h = normalize(v + l);
    let f0 = mix(vec3<f32>(0.04), base_color, u.metallic);

    let ndf = distribution_ggx(n, h, u.roughness);
    let g = geometry_smith(n, v, l, u.roughness);
    let f = fresnel_schlick(max(dot(h, v), 0.0), f0);

    let n_dot_l = max(dot(n, l), 0.0);
    let numerator = ndf * g * f;
    let denominator = 4.0 * max(dot(n, v), 0.0) * n_dot_l + 1e-4;
    let specular = numerator / denominator;

    let k_d = (vec3<f32>(1.0) - f) * (1.0 - u.metallic);
    return (k_d * base_color / PI + specular) * radiance * n_dot_l;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let v = normalize(u.view_pos - in.world_pos);
    let base_color = u.albedo * textureSample(t_diffuse1, s_material, in.tex_coords).rgb;

    // Shadow lookup stays in uniform control flow; the factor is blended in
    // only for the point light.
    let frag_to_light = in.world_pos - u.point_position;
    let closest = textureSample(t_shadow, s_shadow, frag_to_light) * u.far_plane;
    let current = length(frag_to_light);
    var shadow = 0.0;
    if (u.shadows_enabled != 0u && current - 0.05 > closest) {
        shadow = 1.0;
    }

    var lo = vec3<f32>(0.0);

    if (u.point_on != 0u) {
        let to_light = u.point_position - in.world_pos;
        let distance = length(to_light);
        let l = to_light / max(distance, 1e-4);
        let attenuation = 1.0 / max(distance * distance, 1e-4);
        let radiance = u.point_color * u.point_intensity * attenuation;
        lo += cook_torrance(n, v, l, radiance, base_color) * (1.0 - shadow);
    }

    for (var i = 0u; i < u.num_flash_lights && i < 4u; i += 1u) {
        let light = u.flash_lights[i];
        if (light.enabled == 0u) {
            continue;
        }
        let to_light = light.position - in.world_pos;
        let distance = length(to_light);
        let l = to_light / max(distance, 1e-4);
        let theta = dot(l, normalize(-light.direction));
        let epsilon = light.cut_off - light.outer_cut_off;
        let cone = clamp((theta - light.outer_cut_off) / max(epsilon, 1e-4), 0.0, 1.0);
        let attenuation = 1.0
            / max(light.att_constant
                + light.att_linear * distance
                + light.att_quadratic * distance * distance, 1e-4);
        let radiance = light.color * cone * attenuation;
        lo += cook_torrance(n, v, l, radiance, base_color);
    }

    for (var i = 0u; i < u.num_spot_lights && i < 4u; i += 1u) {
        let light = u.spot_lights[i];
        let to_light = light.position - in.world_pos;
        let distance = length(to_light);
        let l = to_light / max(distance, 1e-4);
        let attenuation = 1.0
            / max(light.att_constant
                + light.att_linear * distance
                + light.att_quadratic * distance * distance, 1e-4);
        let radiance = light.color * attenuation;
        lo += cook_torrance(n, v, l, radiance, base_color);
    }

    let ambient = vec3<f32>(0.03) * base_color * u.ao;
    var color = ambient + lo;
    color = color / (color + vec3<f32>(1.0));
    color = pow(color, vec3<f32>(1.0 / 2.2));
    return vec4<f32>(color, 1.0);
}
"#;

/// Skybox rendered at the far plane (`z = w`), depth compare LessEqual.
pub const SKYBOX_SHADER: &str = r#"
struct SkyUniforms {
    project: mat4x4<f32>,
    view: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> u: SkyUniforms;

@group(1) @binding(0) var t_sky: texture_cube<f32>;
@group(1) @binding(1) var s_sky: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) direction: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    let pos = u.project * u.view * vec4<f32>(position, 1.0);
    out.clip_position = pos.xyww;
    out.direction = position;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(t_sky, s_sky, in.direction);
}
"#;

/// Small flat-colored cube marking a light's position.
pub const GIZMO_SHADER: &str = r#"
struct GizmoUniforms {
    project: mat4x4<f32>,
    view: mat4x4<f32>,
    model: mat4x4<f32>,
    light_color: vec3<f32>,
};

@group(0) @binding(0)
var<uniform> u: GizmoUniforms;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.project * u.view * u.model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(u.light_color, 1.0);
}
"#;

/// Depth pass for one shadow cubemap face: writes normalized light distance.
pub const SHADOW_DEPTH_SHADER: &str = r#"
struct ShadowUniforms {
    model: mat4x4<f32>,
    shadow_matrix: mat4x4<f32>,
    light_pos: vec3<f32>,
    far_plane: f32,
};

@group(0) @binding(0)
var<uniform> u: ShadowUniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    let world = u.model * vec4<f32>(position, 1.0);
    var out: VertexOutput;
    out.clip_position = u.shadow_matrix * world;
    out.world_pos = world.xyz;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @builtin(frag_depth) f32 {
    return length(in.world_pos - u.light_pos) / u.far_plane;
}
"#;

/// 3x3 blur copying one source cubemap face into the destination depth
/// attachment via a fullscreen quad.
pub const SHADOW_BLUR_SHADER: &str = r#"
struct BlurUniforms {
    face_index: u32,
    texel: f32,
};

@group(0) @binding(0)
var<uniform> u: BlurUniforms;

@group(1) @binding(0) var t_source: texture_depth_cube;
@group(1) @binding(1) var s_source: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) uv: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(position, 0.0, 1.0);
    out.uv = uv;
    return out;
}

fn face_direction(face: u32, st: vec2<f32>) -> vec3<f32> {
    switch face {
        case 0u: { return vec3<f32>(1.0, -st.y, -st.x); }
        case 1u: { return vec3<f32>(-1.0, -st.y, st.x); }
        case 2u: { return vec3<f32>(st.x, 1.0, st.y); }
        case 3u: { return vec3<f32>(st.x, -1.0, -st.y); }
        case 4u: { return vec3<f32>(st.x, -st.y, 1.0); }
        default: { return vec3<f32>(-st.x, -st.y, -1.0); }
    }
}

@fragment
fn fs_main(in: VertexOutput) -> @builtin(frag_depth) f32 {
    var sum = 0.0;
    for (var dx = -1; dx <= 1; dx += 1) {
        for (var dy = -1; dy <= 1; dy += 1) {
            let offset = vec2<f32>(f32(dx), f32(dy)) * u.texel;
            let st = (in.uv + offset) * 2.0 - vec2<f32>(1.0);
            sum += textureSample(t_source, s_source, face_direction(u.face_index, st));
        }
    }
    return sum / 9.0;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_render::UniformLayout;

    #[test]
    fn pbr_layout_declares_the_classic_names() {
        let layout = pbr_block_layout();
        assert!(layout.locate("pointLight.position").is_some());
        assert!(layout.locate("viewPos").is_some());
        assert!(layout.locate("flash_lights[3].quadratic").is_some());
        assert!(layout.locate("spot_lights[0].color").is_some());
        assert!(layout.locate("material.diffuse1").is_none());
    }

    #[test]
    fn pbr_layout_flash_array_has_declared_stride() {
        let layout = pbr_block_layout();
        let a = layout.locate("flash_lights[0].position").unwrap();
        let b = layout.locate("flash_lights[1].position").unwrap();
        assert_eq!(b.offset - a.offset, FLASH_LIGHT_STRIDE);
    }

    #[test]
    fn pbr_block_is_16_byte_aligned() {
        let layout = pbr_block_layout();
        assert_eq!(layout.byte_len() % 16, 0);
        let last = layout.locate("spot_lights[3].quadratic").unwrap();
        assert!(last.offset + last.size <= layout.byte_len());
    }

    #[test]
    fn shadow_layout_fits_vec3_plus_scalar_tail() {
        let layout = shadow_block_layout();
        let pos = layout.locate("lightPos").unwrap();
        let far = layout.locate("far_plane").unwrap();
        assert_eq!(pos.offset + pos.size, far.offset);
    }
}
