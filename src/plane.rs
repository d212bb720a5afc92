use super::*;

/// Infinite plane of points `p` satisfying `dot(normal, p) = distance`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Normal,
    pub distance: f32,
}

impl Plane {
    #[inline]
    pub fn new(normal: Normal, distance: f32) -> Self {
        Self { normal, distance }
    }

    pub fn from_point_normal(point: &Point3, normal: Normal) -> Self {
        Self {
            normal,
            distance: normal.dot(&point.coords),
        }
    }

    /// Positive in front of the plane, negative behind.
    #[inline]
    pub fn signed_distance(&self, point: &Point3) -> f32 {
        self.normal.dot(&point.coords) - self.distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    #[test]
    fn test_signed_distance() {
        let plane = Plane::from_point_normal(&Point3::new(0.0, 2.0, 0.0), normal![0.0, 1.0, 0.0]);
        assert_ulps_eq!(plane.distance, 2.0, max_ulps = 1);
        assert_ulps_eq!(plane.signed_distance(&Point3::new(5.0, 3.0, -1.0)), 1.0, max_ulps = 1);
        assert_ulps_eq!(plane.signed_distance(&Point3::origin()), -2.0, max_ulps = 1);
    }
}
