use super::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: Point3,
    pub radius: f32,
}

impl Sphere {
    #[inline]
    pub fn new(center: Point3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn bounds(&self) -> Aabb {
        let r = Vec3::repeat(self.radius);
        Aabb::from_min_max(&(self.center - r), &(self.center + r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let sphere = Sphere::new(Point3::new(1.0, 2.0, 3.0), 0.5);
        let bounds = sphere.bounds();
        assert_eq!(bounds.min(), Point3::new(0.5, 1.5, 2.5));
        assert_eq!(bounds.max(), Point3::new(1.5, 2.5, 3.5));
        assert_eq!(bounds.center(), sphere.center);
    }
}
