use super::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub positions: [Point3; 3],
}

impl Triangle {
    #[inline]
    pub fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self {
            positions: [a, b, c],
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.positions)
    }

    pub fn centroid(&self) -> Point3 {
        Point3::from(
            (self.positions[0].coords + self.positions[1].coords + self.positions[2].coords) / 3.0,
        )
    }

    /// Unnormalized normal, counter-clockwise winding. Its length is twice
    /// the triangle area.
    pub fn cross(&self) -> Vec3 {
        let e0 = self.positions[1] - self.positions[0];
        let e1 = self.positions[2] - self.positions[0];
        e0.cross(&e1)
    }

    /// `None` for degenerate triangles.
    pub fn geometric_normal(&self) -> Option<Normal> {
        Normal::try_new(self.cross(), 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    #[test]
    fn test_geometric_normal() {
        let triangle = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let normal = triangle.geometric_normal().unwrap();
        assert_ulps_eq!(normal.z, 1.0, max_ulps = 1);
        assert_ulps_eq!(triangle.cross().norm(), 1.0, max_ulps = 1);
    }

    #[test]
    fn test_degenerate() {
        let triangle = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 2.0, 2.0),
        );
        assert!(triangle.geometric_normal().is_none());
    }

    #[test]
    fn test_centroid_bounds() {
        let triangle = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        );
        let centroid = triangle.centroid();
        assert_ulps_eq!(centroid.x, 1.0, max_ulps = 1);
        assert_ulps_eq!(centroid.y, 1.0, max_ulps = 1);
        let bounds = triangle.bounds();
        assert_eq!(bounds.min(), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max(), Point3::new(3.0, 3.0, 0.0));
    }
}
