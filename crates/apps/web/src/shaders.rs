//! WGSL sources for the map passes.

pub const MESH_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    camera_right: vec4<f32>,
    camera_up: vec4<f32>,
    light_dir: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct Instance {
    @location(2) m0: vec4<f32>,
    @location(3) m1: vec4<f32>,
    @location(4) m2: vec4<f32>,
    @location(5) m3: vec4<f32>,
    @location(6) color: vec4<f32>,
    @location(7) params: vec4<f32>,
};

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) color: vec4<f32>,
    @location(2) emissive: f32,
};

@vertex
fn vs_mesh(@location(0) position: vec3<f32>, @location(1) normal: vec3<f32>, inst: Instance) -> VsOut {
    let model = mat4x4<f32>(inst.m0, inst.m1, inst.m2, inst.m3);
    let world = model * vec4<f32>(position, 1.0);
    let n = (model * vec4<f32>(normal, 0.0)).xyz;
    return VsOut(globals.view_proj * world, n, inst.color, inst.params.x);
}

// Ring vertices carry (cos, sin, edge) where edge 0 is the inner rim.
@vertex
fn vs_ring(@location(0) position: vec3<f32>, @location(1) normal: vec3<f32>, inst: Instance) -> VsOut {
    let model = mat4x4<f32>(inst.m0, inst.m1, inst.m2, inst.m3);
    let r = mix(inst.params.y, 1.0, position.z);
    let world = model * vec4<f32>(position.x * r, position.y * r, 0.0, 1.0);
    let n = (model * vec4<f32>(normal, 0.0)).xyz;
    return VsOut(globals.view_proj * world, n, inst.color, inst.params.x);
}

@fragment
fn fs_lit(in: VsOut) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let l = normalize(globals.light_dir.xyz);
    let shade = 0.35 + 0.65 * max(dot(n, l), 0.0);
    return vec4<f32>(in.color.rgb * (shade + in.emissive), in.color.a);
}

@fragment
fn fs_flat(in: VsOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color.rgb * (1.0 + in.emissive), in.color.a);
}
"#;

pub const LABEL_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    camera_right: vec4<f32>,
    camera_up: vec4<f32>,
    light_dir: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var label_tex: texture_2d<f32>;
@group(1) @binding(1)
var label_sampler: sampler;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_label(
    @location(0) corner: vec2<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) m0: vec4<f32>,
    @location(3) m1: vec4<f32>,
    @location(4) m2: vec4<f32>,
    @location(5) m3: vec4<f32>,
    @location(6) color: vec4<f32>,
    @location(7) params: vec4<f32>,
) -> VsOut {
    // Expand the quad in view space so it always faces the camera.
    let center = m3.xyz;
    let offset = globals.camera_right.xyz * (corner.x * params.y)
        + globals.camera_up.xyz * (corner.y * params.z);
    let world = vec4<f32>(center + offset, 1.0);
    return VsOut(globals.view_proj * world, uv, color);
}

@fragment
fn fs_label(in: VsOut) -> @location(0) vec4<f32> {
    let texel = textureSample(label_tex, label_sampler, in.uv);
    return vec4<f32>(texel.rgb, texel.a * in.color.a);
}
"#;
