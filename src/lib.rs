#![deny(future_incompatible)]
#![deny(nonstandard_style)]
#![deny(clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::float_cmp,
    clippy::many_single_char_names,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::similar_names,
    clippy::wildcard_imports
)]

//! Ray queries against planes, spheres, axis-aligned boxes and triangles.
//!
//! Each `ray_vs_*` routine is a pure function of a [`Ray`] and one primitive.
//! It returns whether the ray hit inside its `[t_min, t_max]` range and, on a
//! hit, writes the parameter and surface normal into a [`Hit`]. [`Scene`]
//! composes the routines into closest-hit and any-hit queries.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use anyhow::{bail, ensure, Context, Result};
use bytemuck::{Pod, Zeroable};
use nalgebra as na;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[macro_use]
extern crate log;

#[macro_use]
pub mod math;

pub mod aabb;
pub mod bvh;
pub mod cfg;
pub mod hit;
pub mod intersection;
pub mod plane;
pub mod ray;
pub mod render;
pub mod scene;
pub mod sphere;
pub mod triangle;

pub use aabb::Aabb;
pub use hit::Hit;
pub use intersection::{
    ray_vs_aabb, ray_vs_plane, ray_vs_sphere, ray_vs_triangle, RayAabbIntersector,
    RayTriangleIntersector,
};
pub use math::*;
pub use plane::Plane;
pub use ray::Ray;
pub use render::Camera;
pub use scene::{Primitive, QueryStats, Scene, SceneConfig};
pub use sphere::Sphere;
pub use triangle::Triangle;

#[cfg(test)]
pub(crate) fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
