use super::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3,
    pub dir: Normal,
    pub t_min: f32,
    pub t_max: f32,
}

impl Ray {
    #[inline]
    pub fn new(origin: Point3, dir: Normal) -> Self {
        Self {
            origin,
            dir,
            t_min: 0.0,
            t_max: f32::MAX,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_range(self, t_min: f32, t_max: f32) -> Self {
        Self {
            t_min,
            t_max,
            ..self
        }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Point3 {
        self.origin + t * self.dir.into_inner()
    }

    /// Whether `t` lies inside the closed range `[t_min, t_max]`.
    #[inline]
    pub fn contains(&self, t: f32) -> bool {
        self.t_min <= t && t <= self.t_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    #[test]
    fn test_at() {
        let ray = Ray::new(Point3::new(1.0, 2.0, 3.0), normal![0.0, 0.0, -1.0]);
        let p = ray.at(2.5);
        assert_ulps_eq!(p.x, 1.0, max_ulps = 1);
        assert_ulps_eq!(p.y, 2.0, max_ulps = 1);
        assert_ulps_eq!(p.z, 0.5, max_ulps = 1);
    }

    #[test]
    fn test_contains() {
        let ray = Ray::new(Point3::origin(), normal![1.0, 0.0, 0.0]).with_range(1.0, 2.0);
        assert!(!ray.contains(0.999));
        assert!(ray.contains(1.0));
        assert!(ray.contains(1.5));
        assert!(ray.contains(2.0));
        assert!(!ray.contains(2.001));
        assert!(!ray.contains(f32::NAN));
    }

    #[test]
    fn test_default_range() {
        let ray = Ray::new(Point3::origin(), normal![1.0, 0.0, 0.0]);
        assert!(ray.contains(0.0));
        assert!(ray.contains(1.0e30));
        assert!(!ray.contains(-f32::EPSILON));
    }
}
