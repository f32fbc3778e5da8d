//! Camera models and pixel remapping for `egopose`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec2`, `Vec3`),
//! - the camera-model capability trait and its two concrete models
//!   (linear/pinhole and fisheye radial-tangential-thin-prism),
//! - the model-to-model image remapping used for undistortion.
//!
//! Remapping pipeline:
//! `target pixel -> unproject(target model) -> ray -> project(source model) -> bilinear sample`

/// Linear algebra type aliases.
pub mod math;
/// Camera projection models.
pub mod models;
/// Model-to-model image remapping.
pub mod remap;

pub use math::*;
pub use models::*;
pub use remap::*;
