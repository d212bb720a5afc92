use super::*;

use crate::bvh::{Bvh, Visit};

//
// Configs
//

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    pub primitives: Vec<PrimitiveConfig>,
    #[serde(default)]
    pub camera: Option<render::CameraConfig>,
}

impl SceneConfig {
    /// Camera described by the config, if any.
    pub fn create_camera(&self) -> Result<Option<Camera>> {
        self.camera
            .as_ref()
            .map(|camera| Camera::from_config(camera).context("Invalid camera"))
            .transpose()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub enum PrimitiveConfig {
    Plane { normal: [f32; 3], distance: f32 },
    Sphere { center: [f32; 3], radius: f32 },
    Aabb { min: [f32; 3], max: [f32; 3] },
    Triangle { positions: [[f32; 3]; 3] },
}

impl PrimitiveConfig {
    fn to_primitive(&self) -> Result<Primitive> {
        let point = |name: &str, p: &[f32; 3]| -> Result<Point3> {
            let point = Point3::from(*p);
            ensure!(
                is_finite_vector(&point.coords),
                "{name} must be finite, got {p:?}"
            );
            Ok(point)
        };

        let primitive = match self {
            Self::Plane { normal, distance } => {
                let normal = Vec3::from(*normal);
                ensure!(
                    is_finite_vector(&normal) && distance.is_finite(),
                    "Plane must be finite, got normal={normal:?} distance={distance}"
                );
                let (normal, length) = Normal::try_new_and_get(normal, f32::EPSILON)
                    .context("Plane normal must not be zero")?;
                Primitive::Plane(Plane::new(normal, distance / length))
            }
            Self::Sphere { center, radius } => {
                ensure!(
                    radius.is_finite() && *radius > 0.0,
                    "Sphere radius must be positive, got {radius}"
                );
                Primitive::Sphere(Sphere::new(point("Sphere center", center)?, *radius))
            }
            Self::Aabb { min, max } => {
                let min = point("Aabb min", min)?;
                let max = point("Aabb max", max)?;
                ensure!(
                    (0..3).all(|axis| min[axis] <= max[axis]),
                    "Aabb min must not exceed max, got min={min} max={max}"
                );
                Primitive::Aabb(Aabb::from_min_max(&min, &max))
            }
            Self::Triangle { positions } => {
                let triangle = Triangle::new(
                    point("Triangle position 0", &positions[0])?,
                    point("Triangle position 1", &positions[1])?,
                    point("Triangle position 2", &positions[2])?,
                );
                if triangle.geometric_normal().is_none() {
                    warn!("Degenerate triangle {positions:?} can never be hit");
                }
                Primitive::Triangle(triangle)
            }
        };
        Ok(primitive)
    }
}

impl From<&Primitive> for PrimitiveConfig {
    fn from(primitive: &Primitive) -> Self {
        let array = |p: &Point3| [p.x, p.y, p.z];
        match primitive {
            Primitive::Plane(plane) => Self::Plane {
                normal: [plane.normal.x, plane.normal.y, plane.normal.z],
                distance: plane.distance,
            },
            Primitive::Sphere(sphere) => Self::Sphere {
                center: array(&sphere.center),
                radius: sphere.radius,
            },
            Primitive::Aabb(aabb) => Self::Aabb {
                min: array(&aabb.min()),
                max: array(&aabb.max()),
            },
            Primitive::Triangle(triangle) => Self::Triangle {
                positions: triangle.positions.map(|p| array(&p)),
            },
        }
    }
}

//
// Primitives
//

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    Plane(Plane),
    Sphere(Sphere),
    Aabb(Aabb),
    Triangle(Triangle),
}

impl Primitive {
    /// Writes `t` and `normal` into `out_hit` on a hit, never `id`.
    #[inline]
    pub fn hit(&self, ray: &Ray, out_hit: &mut Hit) -> bool {
        match self {
            Self::Plane(plane) => ray_vs_plane(ray, plane, out_hit),
            Self::Sphere(sphere) => ray_vs_sphere(ray, sphere, out_hit),
            Self::Aabb(aabb) => ray_vs_aabb(ray, aabb, out_hit),
            Self::Triangle(triangle) => ray_vs_triangle(ray, triangle, out_hit),
        }
    }

    /// `None` for unbounded primitives.
    pub fn bounds(&self) -> Option<Aabb> {
        match self {
            Self::Plane(_) => None,
            Self::Sphere(sphere) => Some(sphere.bounds()),
            Self::Aabb(aabb) => Some(*aabb),
            Self::Triangle(triangle) => Some(triangle.bounds()),
        }
    }
}

impl From<Plane> for Primitive {
    fn from(plane: Plane) -> Self {
        Self::Plane(plane)
    }
}

impl From<Sphere> for Primitive {
    fn from(sphere: Sphere) -> Self {
        Self::Sphere(sphere)
    }
}

impl From<Aabb> for Primitive {
    fn from(aabb: Aabb) -> Self {
        Self::Aabb(aabb)
    }
}

impl From<Triangle> for Primitive {
    fn from(triangle: Triangle) -> Self {
        Self::Triangle(triangle)
    }
}

//
// Stats
//

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct QueryStats {
    pub rays: u64,
    pub primitive_tests: u64,
    pub primitive_hits: u64,
    pub ray_aabb_tests: u64,
    pub ray_aabb_hits: u64,
}

impl std::ops::AddAssign for QueryStats {
    fn add_assign(&mut self, rhs: Self) {
        self.rays += rhs.rays;
        self.primitive_tests += rhs.primitive_tests;
        self.primitive_hits += rhs.primitive_hits;
        self.ray_aabb_tests += rhs.ray_aabb_tests;
        self.ray_aabb_hits += rhs.ray_aabb_hits;
    }
}

impl std::ops::Add for QueryStats {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

//
// Scene
//

/// Primitives tagged with their position as id. Bounded primitives live in a
/// bvh, unbounded ones are tested against every ray.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    primitives: Vec<Primitive>,
    bvh: Bvh,
    bounded: Vec<u32>,
    unbounded: Vec<u32>,
}

impl Scene {
    pub fn create(primitives: Vec<Primitive>) -> Self {
        let mut bounded = vec![];
        let mut bounded_boxes = vec![];
        let mut unbounded = vec![];
        for (id, primitive) in primitives.iter().enumerate() {
            if let Some(bounds) = primitive.bounds() {
                bounded.push(id as u32);
                bounded_boxes.push(bounds);
            } else {
                unbounded.push(id as u32);
            }
        }
        let bvh = Bvh::create(&bounded_boxes);

        info!(
            "Created scene with {} primitives ({} bounded, {} unbounded), {} bvh nodes",
            primitives.len(),
            bounded.len(),
            unbounded.len(),
            bvh.nodes().len()
        );

        Self {
            primitives,
            bvh,
            bounded,
            unbounded,
        }
    }

    pub fn from_config(config: &SceneConfig) -> Result<Self> {
        let primitives = config
            .primitives
            .iter()
            .enumerate()
            .map(|(index, primitive)| {
                primitive
                    .to_primitive()
                    .with_context(|| format!("Invalid primitive at index {index}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::create(primitives))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config: SceneConfig = cfg::read_from_file(path)
            .with_context(|| format!("Failed to read scene from {}", path.display()))?;
        Self::from_config(&config)
    }

    pub fn to_config(&self) -> SceneConfig {
        SceneConfig {
            primitives: self.primitives.iter().map(PrimitiveConfig::from).collect(),
            camera: None,
        }
    }

    #[inline]
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    #[inline]
    pub fn primitive(&self, id: u32) -> Option<&Primitive> {
        self.primitives.get(id as usize)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    #[inline]
    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// Nearest hit inside the ray range. On equal parameters the lower id
    /// wins. `out_hit` is left alone on a miss.
    pub fn closest_hit(&self, ray: &Ray, out_hit: &mut Hit, stats: &mut QueryStats) -> bool {
        stats.rays += 1;

        let mut ray = *ray;
        let mut best: Option<Hit> = None;
        let mut primitive_tests = 0;
        let mut primitive_hits = 0;

        let mut test = |id: u32, ray: &Ray, best: &mut Option<Hit>| -> Option<f32> {
            let mut hit = Hit {
                id,
                ..Hit::default()
            };
            primitive_tests += 1;
            if !self.primitives[id as usize].hit(ray, &mut hit) {
                return None;
            }
            primitive_hits += 1;
            let closer = match best {
                Some(best) => hit.t < best.t || (hit.t == best.t && id < best.id),
                None => true,
            };
            if closer {
                *best = Some(hit);
            }
            Some(hit.t)
        };

        for &id in &self.unbounded {
            if let Some(t) = test(id, &ray, &mut best) {
                ray.t_max = ray.t_max.min(t);
            }
        }

        self.bvh.traverse(&ray, stats, |index, ray| {
            match test(self.bounded[index as usize], ray, &mut best) {
                Some(t) => Visit::Hit(t),
                None => Visit::Miss,
            }
        });

        stats.primitive_tests += primitive_tests;
        stats.primitive_hits += primitive_hits;

        match best {
            Some(hit) => {
                *out_hit = hit;
                true
            }
            None => false,
        }
    }

    /// Whether anything is hit inside the ray range. Stops at the first hit.
    pub fn any_hit(&self, ray: &Ray, stats: &mut QueryStats) -> bool {
        stats.rays += 1;

        let mut primitive_tests = 0;
        let mut primitive_hits = 0;
        let mut test = |id: u32, ray: &Ray| -> bool {
            let mut hit = Hit::default();
            primitive_tests += 1;
            let found = self.primitives[id as usize].hit(ray, &mut hit);
            if found {
                primitive_hits += 1;
            }
            found
        };

        let mut found = self.unbounded.iter().any(|&id| test(id, ray));
        if !found {
            found = !self.bvh.traverse(ray, stats, |index, ray| {
                if test(self.bounded[index as usize], ray) {
                    Visit::Stop
                } else {
                    Visit::Miss
                }
            });
        }

        stats.primitive_tests += primitive_tests;
        stats.primitive_hits += primitive_hits;
        found
    }
}
