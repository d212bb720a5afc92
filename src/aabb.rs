use super::*;

#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    extents: [Point3; 2],
}

impl Aabb {
    /// Empty box with inverted extents, the identity for `merge`.
    #[inline]
    pub fn new() -> Self {
        Self {
            extents: [Vec3::repeat(f32::MAX).into(), Vec3::repeat(-f32::MAX).into()],
        }
    }

    #[inline]
    pub fn from_min_max(min: &Point3, max: &Point3) -> Self {
        Self {
            extents: [*min, *max],
        }
    }

    pub fn from_points<'a, Iter>(points: Iter) -> Self
    where
        Iter: IntoIterator<Item = &'a Point3>,
    {
        let mut aabb = Self::new();
        for point in points {
            aabb.extend(point);
        }
        aabb
    }

    #[inline]
    pub fn min(&self) -> Point3 {
        self.extents[0]
    }

    #[inline]
    pub fn max(&self) -> Point3 {
        self.extents[1]
    }

    /// Lower corner for `false`, upper corner for `true`.
    #[inline]
    pub fn corner(&self, upper: bool) -> Point3 {
        self.extents[usize::from(upper)]
    }

    #[inline]
    pub fn center(&self) -> Point3 {
        na::center(&self.min(), &self.max())
    }

    #[inline]
    pub fn extents(&self) -> Vec3 {
        self.max() - self.min()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min().x > self.max().x || self.min().y > self.max().y || self.min().z > self.max().z
    }

    pub fn contains(&self, point: &Point3) -> bool {
        (0..3).all(|axis| self.min()[axis] <= point[axis] && point[axis] <= self.max()[axis])
    }

    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let extents = self.extents();
        2.0 * (extents.x * extents.y + extents.x * extents.z + extents.y * extents.z)
    }

    pub fn extend(&mut self, point: &Point3) {
        self.extents[0] = self.min().coords.inf(&point.coords).into();
        self.extents[1] = self.max().coords.sup(&point.coords).into();
    }

    pub fn merge(&mut self, other: &Aabb) {
        self.extents[0] = self.min().inf(&other.min());
        self.extents[1] = self.max().sup(&other.max());
    }

    pub fn merged(&self, other: &Aabb) -> Self {
        Self {
            extents: [self.min().inf(&other.min()), self.max().sup(&other.max())],
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    #[test]
    fn test_empty_is_merge_identity() {
        let empty = Aabb::new();
        assert!(empty.is_empty());
        assert_ulps_eq!(empty.surface_area(), 0.0, max_ulps = 1);

        let unit = Aabb::from_min_max(&Point3::origin(), &Point3::new(1.0, 1.0, 1.0));
        assert_eq!(empty.merged(&unit), unit);
        assert_eq!(unit.merged(&empty), unit);
    }

    #[test]
    fn test_from_points() {
        let points = [
            Point3::new(1.0, -2.0, 0.5),
            Point3::new(-1.0, 3.0, 0.0),
            Point3::new(0.0, 0.0, 4.0),
        ];
        let aabb = Aabb::from_points(&points);
        assert_eq!(aabb.min(), Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max(), Point3::new(1.0, 3.0, 4.0));
        assert!(points.iter().all(|p| aabb.contains(p)));
        assert!(!aabb.contains(&Point3::new(0.0, 0.0, 4.5)));
    }

    #[test]
    fn test_surface_area() {
        let aabb = Aabb::from_min_max(&Point3::origin(), &Point3::new(1.0, 2.0, 3.0));
        assert_ulps_eq!(aabb.surface_area(), 22.0, max_ulps = 1);
        let center = aabb.center();
        assert_ulps_eq!(center.y, 1.0, max_ulps = 1);
    }

    #[test]
    fn test_pod_layout() {
        assert_eq!(std::mem::size_of::<Aabb>(), 24);
        let aabb = Aabb::from_min_max(&Point3::origin(), &Point3::new(1.0, 2.0, 3.0));
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&aabb));
        assert_eq!(floats, &[0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
    }
}
