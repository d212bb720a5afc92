use super::*;

/// Where and how a ray met a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// Identifier of the primitive, owned by the caller. Intersection
    /// routines only write `t` and `normal`.
    pub id: u32,
    pub t: f32,
    pub normal: Normal,
}

impl Hit {
    #[inline]
    pub fn point(&self, ray: &Ray) -> Point3 {
        ray.at(self.t)
    }
}

impl Default for Hit {
    fn default() -> Self {
        Self {
            id: u32::MAX,
            t: f32::MAX,
            normal: Normal::new_unchecked(Y_AXIS),
        }
    }
}
