use super::*;

use std::time::Instant;

use rand::prelude::*;
use rayon::prelude::*;

//
// Configs
//

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    #[serde(default = "CameraConfig::default_up")]
    pub up: [f32; 3],
    pub yfov_deg: f32,
}

impl CameraConfig {
    fn default_up() -> [f32; 3] {
        [0.0, 1.0, 0.0]
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Params {
    pub image_size: (u32, u32),
    pub samples_per_pixel: u32,
    pub seed: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            image_size: (320, 180),
            samples_per_pixel: 1,
            seed: 0,
        }
    }
}

//
// Camera
//

const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 1000.0;

/// Pinhole camera looking from `position` towards a target.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    world_from_view: na::Isometry3<f32>,
    yfov: f32,
}

impl Camera {
    pub fn look_at(position: Point3, target: Point3, up: &Vec3, yfov_deg: f32) -> Result<Self> {
        ensure!(
            yfov_deg > 0.0 && yfov_deg < 180.0,
            "Camera vertical field of view must be in (0, 180) degrees, got {yfov_deg}"
        );
        ensure!(
            is_finite_vector(&position.coords) && is_finite_vector(&target.coords),
            "Camera position and target must be finite"
        );
        let forward = Normal::try_new(target - position, f32::EPSILON)
            .context("Camera target must differ from its position")?;
        ensure!(
            Normal::try_new(forward.cross(up), f32::EPSILON).is_some(),
            "Camera up must not be parallel to the view direction"
        );
        let view_from_world = na::Isometry3::look_at_rh(&position, &target, up);
        Ok(Self {
            world_from_view: view_from_world.inverse(),
            yfov: yfov_deg.to_radians(),
        })
    }

    pub fn from_config(config: &CameraConfig) -> Result<Self> {
        Self::look_at(
            Point3::from(config.position),
            Point3::from(config.target),
            &Vec3::from(config.up),
            config.yfov_deg,
        )
    }

    #[inline]
    pub fn position(&self) -> Point3 {
        self.world_from_view * Point3::origin()
    }

    pub fn clip_from_view(&self, (image_w, image_h): (u32, u32)) -> Perspective3 {
        Perspective3::new(image_w as f32 / image_h as f32, self.yfov, Z_NEAR, Z_FAR)
    }

    pub fn world_from_clip(&self, image_size: (u32, u32)) -> Mat4 {
        self.world_from_view.to_homogeneous() * self.clip_from_view(image_size).inverse()
    }
}

/// Ray through `pixel` offset by `(s, t)` in `[0, 1)`. Image rows go top to
/// bottom.
pub fn primary_ray(
    (pixel_x, pixel_y): (u32, u32),
    (image_w, image_h): (u32, u32),
    camera_position: &Point3,
    world_from_clip: &Mat4,
    s: f32,
    t: f32,
) -> Ray {
    // Center pixel.
    let px = pixel_x as f32 + s;
    let py = pixel_y as f32 + t;

    // Normalize 0..window -> 0..1.
    let px = px / image_w as f32;
    let py = py / image_h as f32;

    // Flip Y, clip space points up.
    let py = 1.0 - py;

    // Scale 0..1 -> -1..1.
    let px = 2.0 * px - 1.0;
    let py = 2.0 * py - 1.0;

    // Transform.
    let pxyzw = world_from_clip * vector![px, py, 1.0, 1.0];
    let pxyz = pxyzw.fixed_rows::<3>(0);
    let p = Point3::from(pxyz / pxyzw.w);

    Ray::new(*camera_position, Normal::new_normalize(p - camera_position))
}

fn pixel_count((image_w, image_h): (u32, u32)) -> Result<usize> {
    (image_w as usize)
        .checked_mul(image_h as usize)
        .with_context(|| format!("Image size {image_w}x{image_h} is too large"))
}

//
// Sampling
//

pub struct UniformSampler {
    state: rand_pcg::Pcg64Mcg,
    distribution: rand::distributions::Uniform<f32>,
}

impl UniformSampler {
    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            state: rand_pcg::Pcg64Mcg::seed_from_u64(seed),
            distribution: rand::distributions::Uniform::new(0.0, 1.0),
        }
    }

    pub fn sample(&mut self) -> f32 {
        self.distribution.sample(&mut self.state)
    }
}

//
// Render
//

pub struct Output {
    pub image: Vec<ColorRgb>,
    pub image_size: (u32, u32),
    pub stats: QueryStats,
}

fn sky(ray: &Ray) -> ColorRgb {
    let horizon = ColorRgb::WHITE;
    let zenith = ColorRgb::new(0.5, 0.7, 1.0);
    lerp_color(&horizon, &zenith, 0.5 * (ray.dir.y + 1.0))
}

/// Visualizes closest-hit normals, one row per task. With a single sample
/// every ray goes through the pixel center.
pub fn render_normals(scene: &Scene, camera: &Camera, params: &Params) -> Result<Output> {
    let (image_w, image_h) = params.image_size;
    ensure!(
        image_w > 0 && image_h > 0,
        "Image size must not be zero, got {image_w}x{image_h}"
    );
    ensure!(params.samples_per_pixel > 0, "Samples per pixel must not be zero");

    let camera_position = camera.position();
    let world_from_clip = camera.world_from_clip(params.image_size);

    let timer = Instant::now();
    let mut image = vec![ColorRgb::BLACK; pixel_count(params.image_size)?];
    let stats = image
        .par_chunks_mut(image_w as usize)
        .enumerate()
        .map(|(pixel_y, row)| {
            let pixel_y = pixel_y as u32;
            let mut stats = QueryStats::default();
            let mut uniform = UniformSampler::new_with_seed(params.seed ^ u64::from(pixel_y));
            let normalization_factor = 1.0 / params.samples_per_pixel as f32;
            for (pixel_x, dst) in row.iter_mut().enumerate() {
                let mut radiance = ColorRgb::BLACK;
                for _ in 0..params.samples_per_pixel {
                    let (s, t) = if params.samples_per_pixel == 1 {
                        (0.5, 0.5)
                    } else {
                        (uniform.sample(), uniform.sample())
                    };
                    let ray = primary_ray(
                        (pixel_x as u32, pixel_y),
                        params.image_size,
                        &camera_position,
                        &world_from_clip,
                        s,
                        t,
                    );
                    let mut hit = Hit::default();
                    radiance += if scene.closest_hit(&ray, &mut hit, &mut stats) {
                        ColorRgb::from_normal(&hit.normal)
                    } else {
                        sky(&ray)
                    };
                }
                *dst = radiance * normalization_factor;
            }
            stats
        })
        .reduce(QueryStats::default, |a, b| a + b);

    let elapsed = timer.elapsed().as_secs_f64();
    info!(
        "Rendering took {:.03} s, {:.03} rays/s",
        elapsed,
        stats.rays as f64 / elapsed
    );
    debug!("Stats: {stats:#?}");

    Ok(Output {
        image,
        image_size: params.image_size,
        stats,
    })
}

pub fn save_png(image: &[ColorRgb], (image_w, image_h): (u32, u32), path: &Path) -> Result<()> {
    if image.len() != pixel_count((image_w, image_h))? {
        bail!(
            "Image has {} pixels, expected {image_w}x{image_h}",
            image.len()
        );
    }
    let mut out_image = imagelib::RgbImage::new(image_w, image_h);
    image
        .iter()
        .zip(out_image.pixels_mut())
        .for_each(|(src, dst)| {
            *dst = imagelib::Rgb(src.into_srgb8());
        });
    out_image
        .save(path)
        .with_context(|| format!("Failed to save image to {}", path.display()))?;
    info!("Saved {}", path.display());
    Ok(())
}
