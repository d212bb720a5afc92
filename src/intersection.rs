use super::*;

/// Below this `|dot(normal, dir)|` a ray counts as parallel to a plane.
pub const PARALLEL_EPSILON: f32 = 1e-6;

//
// Plane
//

pub fn ray_vs_plane(ray: &Ray, plane: &Plane, out_hit: &mut Hit) -> bool {
    let denom = plane.normal.dot(&ray.dir);
    if denom.abs() < PARALLEL_EPSILON {
        return false;
    }

    let t = -plane.signed_distance(&ray.origin) / denom;
    if !ray.contains(t) {
        return false;
    }

    out_hit.t = t;
    out_hit.normal = if denom > 0.0 {
        -plane.normal
    } else {
        plane.normal
    };
    true
}

//
// Sphere
//

/// Both parameters where the ray's line crosses the sphere, ordered, ignoring
/// the ray range.
pub fn sphere_roots(ray: &Ray, sphere: &Sphere) -> Option<(f32, f32)> {
    // The direction is unit length, so the quadratic's leading coefficient
    // is one and the half-b form applies.
    let oc = ray.origin - sphere.center;
    let b = oc.dot(&ray.dir);
    let c = oc.norm_squared() - sphere.radius * sphere.radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_discriminant = discriminant.sqrt();
    Some((-b - sqrt_discriminant, -b + sqrt_discriminant))
}

pub fn ray_vs_sphere(ray: &Ray, sphere: &Sphere, out_hit: &mut Hit) -> bool {
    if sphere.radius <= 0.0 {
        return false;
    }

    let (t0, t1) = match sphere_roots(ray, sphere) {
        Some(roots) => roots,
        None => return false,
    };

    // Nearest root first; the far root is the exit when the origin is inside.
    let t = if ray.contains(t0) {
        t0
    } else if ray.contains(t1) {
        t1
    } else {
        return false;
    };

    let outward = Normal::new_normalize(ray.at(t) - sphere.center);
    out_hit.t = t;
    out_hit.normal = face_forward(&outward, &ray.dir);
    true
}

//
// Aabb
//

pub struct RayAabbIntersector {
    ray_dir_inv: Vec3,
    ray_dir_neg: Vec3b,
}

/// Parametric interval where a ray's line is inside all three slabs.
#[derive(Clone, Copy, Debug)]
struct SlabInterval {
    t_entry: f32,
    entry_axis: usize,
    t_exit: f32,
    exit_axis: usize,
}

impl RayAabbIntersector {
    // Implementation based on PBRT.

    pub fn new(ray: &Ray) -> Self {
        let ray_dir_inv = vector![1.0 / ray.dir[0], 1.0 / ray.dir[1], 1.0 / ray.dir[2]];
        let ray_dir_neg = vector![
            ray_dir_inv.x < 0.0,
            ray_dir_inv.y < 0.0,
            ray_dir_inv.z < 0.0
        ];
        Self {
            ray_dir_inv,
            ray_dir_neg,
        }
    }

    #[inline]
    fn gamma(n: f32) -> f32 {
        const MACHINE_EPSILON: f32 = f32::EPSILON * 0.5;
        (n * MACHINE_EPSILON) / (1.0 - n * MACHINE_EPSILON)
    }

    /// Whether the ray is heading towards the negative side of `axis`.
    #[inline]
    pub fn is_dir_negative(&self, axis: usize) -> bool {
        self.ray_dir_neg[axis]
    }

    fn slabs(&self, ray: &Ray, aabb: &Aabb) -> Option<SlabInterval> {
        // Ensures robust bounds intersection.
        let robust_scale = 1.0 + 2.0 * Self::gamma(3.0);

        let mut interval = SlabInterval {
            t_entry: f32::NEG_INFINITY,
            entry_axis: 0,
            t_exit: f32::INFINITY,
            exit_axis: 0,
        };
        for axis in 0..3 {
            let neg = self.ray_dir_neg[axis];
            let t_near = (aabb.corner(neg)[axis] - ray.origin[axis]) * self.ray_dir_inv[axis];
            let t_far = (aabb.corner(!neg)[axis] - ray.origin[axis]) * self.ray_dir_inv[axis];

            // A NaN comes from an origin on a slab plane with a zero direction
            // component. The comparisons below ignore it.
            if t_near > interval.t_entry {
                interval.t_entry = t_near;
                interval.entry_axis = axis;
            }
            if t_far < interval.t_exit {
                interval.t_exit = t_far;
                interval.exit_axis = axis;
            }
            if interval.t_entry > interval.t_exit * robust_scale {
                return None;
            }
        }

        (interval.t_entry < f32::INFINITY).then_some(interval)
    }

    /// Whether the box overlaps the ray range at all.
    pub fn hit(&self, ray: &Ray, aabb: &Aabb) -> bool {
        match self.slabs(ray, aabb) {
            Some(interval) => interval.t_entry <= ray.t_max && interval.t_exit >= ray.t_min,
            None => false,
        }
    }

    /// Like `hit`, but also reports the first box surface inside the range.
    /// For an origin inside the box that is the exit face.
    pub fn hit_surface(&self, ray: &Ray, aabb: &Aabb, out_hit: &mut Hit) -> bool {
        let interval = match self.slabs(ray, aabb) {
            Some(interval) => interval,
            None => return false,
        };

        let (t, axis) = if interval.t_entry >= ray.t_min {
            (interval.t_entry, interval.entry_axis)
        } else {
            (interval.t_exit, interval.exit_axis)
        };
        if !ray.contains(t) {
            return false;
        }

        // Entry faces point against the direction, and so do exit faces once
        // flipped towards the ray.
        let mut normal = Vec3::zeros();
        normal[axis] = if self.ray_dir_neg[axis] { 1.0 } else { -1.0 };

        out_hit.t = t;
        out_hit.normal = Normal::new_unchecked(normal);
        true
    }
}

pub fn ray_vs_aabb(ray: &Ray, aabb: &Aabb, out_hit: &mut Hit) -> bool {
    RayAabbIntersector::new(ray).hit_surface(ray, aabb, out_hit)
}

//
// Triangle
//

pub struct RayTriangleIntersector {
    k: Vec3u,
    s: Vec3,
}

impl RayTriangleIntersector {
    // Implementation based on "Watertight Ray/Triangle Intersection".
    // https://jcgt.org/published/0002/01/05/

    pub fn new(ray: &Ray) -> Self {
        // Calculate dimension where the ray direction is maximal.
        let mut k = vector![0xffff_ffff, 0xffff_ffff, 0xffff_ffff];
        k.z = ray.dir.abs().argmax().0 as u32;
        k.x = k.z + 1;
        if k.x == 3 {
            k.x = 0;
        }
        k.y = k.x + 1;
        if k.y == 3 {
            k.y = 0;
        }

        // Swap kx and ky dimension to preserve winding direction of triangles.
        if ray.dir[k.z as usize] < 0.0 {
            let tmp = k.x;
            k.x = k.y;
            k.y = tmp;
        }

        // Calculate shear constants.
        let s = vector![
            ray.dir[k.x as usize] / ray.dir[k.z as usize],
            ray.dir[k.y as usize] / ray.dir[k.z as usize],
            1.0 / ray.dir[k.z as usize]
        ];

        Self { k, s }
    }

    /// Writes the hit parameter and barycentrics only on a hit inside the
    /// ray range. Both windings are accepted.
    pub fn hit(&self, ray: &Ray, triangle: &Triangle, out_t: &mut f32, out_uvw: &mut Vec3) -> bool {
        // Aliases.
        let k = self.k;
        let s = self.s;

        // Unpack triangle.
        let a = triangle.positions[0] - ray.origin;
        let b = triangle.positions[1] - ray.origin;
        let c = triangle.positions[2] - ray.origin;

        // Perform shear and scale of vertices.
        let ax = a[k.x as usize] - s.x * a[k.z as usize];
        let ay = a[k.y as usize] - s.y * a[k.z as usize];
        let bx = b[k.x as usize] - s.x * b[k.z as usize];
        let by = b[k.y as usize] - s.y * b[k.z as usize];
        let cx = c[k.x as usize] - s.x * c[k.z as usize];
        let cy = c[k.y as usize] - s.y * c[k.z as usize];

        // Calculate scaled barycentric coordinates.
        let mut u = cx * by - cy * bx;
        let mut v = ax * cy - ay * cx;
        let mut w = bx * ay - by * ax;

        // Fallback to test against edges using double precision.
        if u == 0.0 || v == 0.0 || w == 0.0 {
            let cxby = f64::from(cx) * f64::from(by);
            let cybx = f64::from(cy) * f64::from(bx);
            u = (cxby - cybx) as f32;
            let axcy = f64::from(ax) * f64::from(cy);
            let aycx = f64::from(ay) * f64::from(cx);
            v = (axcy - aycx) as f32;
            let bxay = f64::from(bx) * f64::from(ay);
            let byax = f64::from(by) * f64::from(ax);
            w = (bxay - byax) as f32;
        }

        // Perform edge tests, mixed signs mean the ray passes outside.
        if (u < 0.0 || v < 0.0 || w < 0.0) && (u > 0.0 || v > 0.0 || w > 0.0) {
            return false;
        }

        // Calculate determinant, zero for edge-on and degenerate triangles.
        let det = u + v + w;
        if det == 0.0 {
            return false;
        }

        // Calculate scaled z-coordinates of vertices and use them to calculate the hit distance.
        let az = s.z * a[k.z as usize];
        let bz = s.z * b[k.z as usize];
        let cz = s.z * c[k.z as usize];
        let rcpdet = 1.0 / det;
        let t = (u * az + v * bz + w * cz) * rcpdet;
        if !ray.contains(t) {
            return false;
        }

        // Normalize.
        *out_uvw = vector![u * rcpdet, v * rcpdet, w * rcpdet];
        *out_t = t;

        true
    }
}

pub fn ray_vs_triangle(ray: &Ray, triangle: &Triangle, out_hit: &mut Hit) -> bool {
    let normal = match triangle.geometric_normal() {
        Some(normal) => normal,
        None => return false,
    };

    let mut t = 0.0;
    let mut barycentrics = Vec3::zeros();
    if !RayTriangleIntersector::new(ray).hit(ray, triangle, &mut t, &mut barycentrics) {
        return false;
    }

    out_hit.t = t;
    out_hit.normal = face_forward(&normal, &ray.dir);
    true
}

//
// Tests
//
