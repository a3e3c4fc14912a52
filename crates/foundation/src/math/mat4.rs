//! Column-major `f32` matrices for GPU upload.

use super::{Quat, Vec3};

pub type Mat4 = [[f32; 4]; 4];

pub const MAT4_IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

pub fn mat4_mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut c = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            c[col][row] = a[0][row] * b[col][0]
                + a[1][row] * b[col][1]
                + a[2][row] * b[col][2]
                + a[3][row] * b[col][3];
        }
    }
    c
}

/// Right-handed perspective with a `[0, 1]` depth range.
pub fn mat4_perspective_rh_z0(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> Mat4 {
    let f = 1.0 / (0.5 * fov_y_rad).tan();
    let m00 = (f / aspect) as f32;
    let m11 = f as f32;
    let m22 = (far / (near - far)) as f32;
    let m23 = ((near * far) / (near - far)) as f32;

    [
        [m00, 0.0, 0.0, 0.0],
        [0.0, m11, 0.0, 0.0],
        [0.0, 0.0, m22, -1.0],
        [0.0, 0.0, m23, 0.0],
    ]
}

pub fn mat4_look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let f = (target - eye).normalize().unwrap_or(Vec3::new(0.0, 0.0, -1.0));
    let s = f.cross(up).normalize().unwrap_or(Vec3::new(1.0, 0.0, 0.0));
    let u = s.cross(f);

    let ex = -s.dot(eye);
    let ey = -u.dot(eye);
    let ez = f.dot(eye);

    [
        [s.x as f32, u.x as f32, (-f.x) as f32, 0.0],
        [s.y as f32, u.y as f32, (-f.y) as f32, 0.0],
        [s.z as f32, u.z as f32, (-f.z) as f32, 0.0],
        [ex as f32, ey as f32, ez as f32, 1.0],
    ]
}

/// Model matrix: translate * rotate * uniform scale.
pub fn mat4_from_trs(translation: Vec3, rotation: Quat, scale: f64) -> Mat4 {
    let x = rotation.rotate(Vec3::new(scale, 0.0, 0.0));
    let y = rotation.rotate(Vec3::new(0.0, scale, 0.0));
    let z = rotation.rotate(Vec3::new(0.0, 0.0, scale));
    [
        [x.x as f32, x.y as f32, x.z as f32, 0.0],
        [y.x as f32, y.y as f32, y.z as f32, 0.0],
        [z.x as f32, z.y as f32, z.z as f32, 0.0],
        [
            translation.x as f32,
            translation.y as f32,
            translation.z as f32,
            1.0,
        ],
    ]
}

pub fn mat4_transform_point(m: Mat4, p: Vec3) -> [f32; 4] {
    let v = [p.x as f32, p.y as f32, p.z as f32, 1.0];
    let mut out = [0.0f32; 4];
    for (row, o) in out.iter_mut().enumerate() {
        *o = m[0][row] * v[0] + m[1][row] * v[1] + m[2][row] * v[2] + m[3][row] * v[3];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_neutral_for_mul() {
        let m = mat4_from_trs(Vec3::new(1.0, 2.0, 3.0), Quat::from_yaw_pitch(0.3, 0.2), 2.0);
        assert_eq!(mat4_mul(MAT4_IDENTITY, m), m);
        assert_eq!(mat4_mul(m, MAT4_IDENTITY), m);
    }

    #[test]
    fn trs_translates_origin() {
        let m = mat4_from_trs(Vec3::new(4.0, -1.0, 2.0), Quat::IDENTITY, 3.0);
        assert_eq!(mat4_transform_point(m, Vec3::ZERO), [4.0, -1.0, 2.0, 1.0]);
        assert_eq!(
            mat4_transform_point(m, Vec3::new(1.0, 0.0, 0.0)),
            [7.0, -1.0, 2.0, 1.0]
        );
    }

    #[test]
    fn look_at_puts_target_on_negative_z_axis() {
        let view = mat4_look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::UP);
        let p = mat4_transform_point(view, Vec3::ZERO);
        assert!(p[0].abs() < 1e-6);
        assert!(p[1].abs() < 1e-6);
        assert!((p[2] + 10.0).abs() < 1e-5);
    }

    #[test]
    fn perspective_maps_near_plane_to_zero_depth() {
        let proj = mat4_perspective_rh_z0(1.0, 1.5, 0.5, 100.0);
        let p = mat4_transform_point(proj, Vec3::new(0.0, 0.0, -0.5));
        assert!((p[2] / p[3]).abs() < 1e-5);
    }
}
