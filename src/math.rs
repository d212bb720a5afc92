use super::*;

//
// Linear algebra
//

pub use na::vector;

pub type Vec3 = na::Vector3<f32>;

pub type Vec3b = na::Vector3<bool>;
pub type Vec3u = na::Vector3<u32>;

pub type Mat4 = na::Matrix4<f32>;

pub type Point3 = na::Point3<f32>;

pub type Normal = na::UnitVector3<f32>;

pub type Perspective3 = na::Perspective3<f32>;

pub const X_AXIS: Vec3 = vector![1.0, 0.0, 0.0];
pub const Y_AXIS: Vec3 = vector![0.0, 1.0, 0.0];
pub const Z_AXIS: Vec3 = vector![0.0, 0.0, 1.0];

#[macro_export]
macro_rules! normal {
    ($v:expr) => {
        nalgebra::Unit::new_normalize($v)
    };

    ($x:expr, $y:expr, $z:expr) => {
        nalgebra::Unit::new_normalize(nalgebra::Vector3::<f32>::new($x, $y, $z))
    };
}

/// Returns `normal` flipped so that it faces against `dir`.
#[inline]
pub fn face_forward(normal: &Normal, dir: &Normal) -> Normal {
    if normal.dot(dir) > 0.0 {
        -*normal
    } else {
        *normal
    }
}

pub fn is_finite_vector(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

//
// Color
//

#[repr(C)]
#[derive(Clone, Copy, PartialEq, Debug, Pod, Zeroable, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorRgb([f32; 3]);

impl ColorRgb {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self([r, g, b])
    }

    #[inline]
    pub const fn red(&self) -> f32 {
        self.0[0]
    }

    #[inline]
    pub const fn green(&self) -> f32 {
        self.0[1]
    }

    #[inline]
    pub const fn blue(&self) -> f32 {
        self.0[2]
    }

    /// Maps each component of a unit normal from `[-1, 1]` to `[0, 1]`.
    pub fn from_normal(normal: &Normal) -> Self {
        Self::new(
            0.5 * (normal.x + 1.0),
            0.5 * (normal.y + 1.0),
            0.5 * (normal.z + 1.0),
        )
    }

    /// Clamps to `[0, 1]` and encodes with the sRGB transfer function.
    pub fn into_srgb8(self) -> [u8; 3] {
        use palette::{LinSrgb, Srgb};
        let linear = LinSrgb::<f32>::new(
            self.red().clamp(0.0, 1.0),
            self.green().clamp(0.0, 1.0),
            self.blue().clamp(0.0, 1.0),
        );
        let srgb: Srgb<u8> = Srgb::<f32>::from_linear(linear).into_format();
        srgb.into()
    }
}

impl std::ops::AddAssign for ColorRgb {
    fn add_assign(&mut self, rhs: Self) {
        self.0[0] += rhs.0[0];
        self.0[1] += rhs.0[1];
        self.0[2] += rhs.0[2];
    }
}

impl std::ops::Mul<f32> for ColorRgb {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self([self.0[0] * rhs, self.0[1] * rhs, self.0[2] * rhs])
    }
}

//
// Interpolation
//

pub fn lerp_scalar<T: num::Float>(a: T, b: T, t: T) -> T {
    a * (T::one() - t) + b * t
}

pub fn lerp_color(a: &ColorRgb, b: &ColorRgb, t: f32) -> ColorRgb {
    ColorRgb::new(
        lerp_scalar(a.red(), b.red(), t),
        lerp_scalar(a.green(), b.green(), t),
        lerp_scalar(a.blue(), b.blue(), t),
    )
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    #[test]
    fn test_normal_macro() {
        let result = 0.577_350_26;
        let normal: Normal = normal![1.0, 1.0, 1.0];
        assert_ulps_eq!(normal.x, result, max_ulps = 1);
        assert_ulps_eq!(normal.y, result, max_ulps = 1);
        assert_ulps_eq!(normal.z, result, max_ulps = 1);

        let normal: Normal = normal![vector![1.0, 1.0, 1.0]];
        assert_ulps_eq!(normal.x, result, max_ulps = 1);
        assert_ulps_eq!(normal.y, result, max_ulps = 1);
        assert_ulps_eq!(normal.z, result, max_ulps = 1);
    }

    #[test]
    fn test_face_forward() {
        let n: Normal = normal![0.0, 1.0, 0.0];
        let down: Normal = normal![0.0, -1.0, 0.0];
        let up: Normal = normal![0.0, 1.0, 0.0];
        assert_eq!(face_forward(&n, &down), n);
        assert_eq!(face_forward(&n, &up), -n);
    }

    #[test]
    fn test_lerp_scalar() {
        assert_ulps_eq!(lerp_scalar(0.0, 1.0, 0.0), 0.0, max_ulps = 1);
        assert_ulps_eq!(lerp_scalar(0.0, 1.0, 0.5), 0.5, max_ulps = 1);
        assert_ulps_eq!(lerp_scalar(0.0, 1.0, 1.0), 1.0, max_ulps = 1);
    }

    #[test]
    fn test_lerp_color() {
        let c = lerp_color(&ColorRgb::BLACK, &ColorRgb::WHITE, 0.5);
        assert_ulps_eq!(c.red(), 0.5, max_ulps = 1);
        assert_ulps_eq!(c.green(), 0.5, max_ulps = 1);
        assert_ulps_eq!(c.blue(), 0.5, max_ulps = 1);
    }

    #[test]
    fn test_into_srgb8() {
        assert_eq!(ColorRgb::BLACK.into_srgb8(), [0, 0, 0]);
        assert_eq!(ColorRgb::WHITE.into_srgb8(), [255, 255, 255]);
        assert_eq!(ColorRgb::new(2.0, -1.0, 0.0).into_srgb8(), [255, 0, 0]);

        // Mid gray is brightened by the transfer curve.
        let [r, g, b] = ColorRgb::new(0.5, 0.5, 0.5).into_srgb8();
        assert!((187..=188).contains(&r));
        assert_eq!(r, g);
        assert_eq!(g, b);
    }
}
