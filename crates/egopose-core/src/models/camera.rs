use crate::{Vec2, Vec3};

/// Capability interface of a camera model.
///
/// A model owns its intrinsic parameters and maps between 3D directions in
/// the camera frame and pixel coordinates on its image plane. Pixel
/// coordinates follow the integer-at-center convention.
pub trait CameraModel {
    /// Project a 3D point in camera coordinates to a pixel.
    ///
    /// Returns `None` when the point is not projectable (e.g. behind the
    /// camera).
    fn project(&self, p_c: &Vec3) -> Option<Vec2>;

    /// Unproject a pixel to a unit direction in camera coordinates.
    fn unproject(&self, px: &Vec2) -> Vec3;
}
