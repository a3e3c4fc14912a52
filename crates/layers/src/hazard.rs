use foundation::math::Vec3;

/// Derived sphere enclosing every member of the high-risk category.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HazardZoneVolume {
    pub centroid: Vec3,
    /// Farthest member distance from the centroid plus the margin.
    pub radius: f64,
    pub members: usize,
}

/// `None` unless at least two member positions are given.
pub fn hazard_zone(members: &[Vec3], margin: f64) -> Option<HazardZoneVolume> {
    if members.len() < 2 {
        return None;
    }
    let sum = members.iter().fold(Vec3::ZERO, |acc, p| acc + *p);
    let centroid = sum * (1.0 / members.len() as f64);
    let spread = members
        .iter()
        .map(|p| p.distance(centroid))
        .fold(0.0, f64::max);
    Some(HazardZoneVolume {
        centroid,
        radius: spread + margin.max(0.0),
        members: members.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::hazard_zone;
    use foundation::math::Vec3;

    #[test]
    fn needs_two_members() {
        assert!(hazard_zone(&[], 2.0).is_none());
        assert!(hazard_zone(&[Vec3::new(1.0, 2.0, 3.0)], 2.0).is_none());
    }

    #[test]
    fn radius_is_max_centroid_distance_plus_margin() {
        let zone = hazard_zone(
            &[
                Vec3::new(-4.0, 0.0, 0.0),
                Vec3::new(4.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            3.0,
        )
        .expect("zone");
        let centroid = Vec3::new(0.0, 0.0, 1.0 / 3.0);
        assert!(zone.centroid.distance(centroid) < 1e-12);
        let far = Vec3::new(4.0, 0.0, 0.0).distance(centroid);
        assert!((zone.radius - (far + 3.0)).abs() < 1e-12);
        assert_eq!(zone.members, 3);
    }
}
