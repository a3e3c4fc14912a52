//! Unit quaternions `[x, y, z, w]` for camera and billboard orientation.

use super::Vec3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quat(pub [f64; 4]);

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat([0.0, 0.0, 0.0, 1.0]);

    /// Yaw around +Y composed with pitch around +X (`yaw * pitch`).
    pub fn from_yaw_pitch(yaw_rad: f64, pitch_rad: f64) -> Self {
        let (sy, cy) = (yaw_rad * 0.5).sin_cos();
        let (sp, cp) = (pitch_rad * 0.5).sin_cos();
        Quat([cy * sp, sy * cp, -sy * sp, cy * cp])
    }

    /// Rotate `v` by this (unit) quaternion.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let qv = Vec3::new(self.0[0], self.0[1], self.0[2]);
        let t = qv.cross(v) * 2.0;
        v + t * self.0[3] + qv.cross(t)
    }

    pub fn to_f32(self) -> [f32; 4] {
        [
            self.0[0] as f32,
            self.0[1] as f32,
            self.0[2] as f32,
            self.0[3] as f32,
        ]
    }
}
