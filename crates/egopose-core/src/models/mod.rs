//! Camera projection models.
//!
//! Each model maps both ways across the full pixel pipeline:
//!
//! `pixel = project(direction)` and `direction = unproject(pixel)`
//!
//! [`LinearCamera`] is the rectilinear target used for undistortion output;
//! [`FisheyeRadTanThinPrism`] matches the raw wide-field sensor optics and the
//! parameter layout of the exported calibration JSON.

mod camera;
mod fisheye;
mod linear;

pub use camera::*;
pub use fisheye::*;
pub use linear::*;
