use serde::{Deserialize, Serialize};

use super::CameraModel;
use crate::{Real, Vec2, Vec3};

/// Rectilinear (pinhole) camera with zero skew.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LinearCamera {
    /// Focal length in pixels along X.
    pub fx: Real,
    /// Focal length in pixels along Y.
    pub fy: Real,
    /// Principal point X coordinate in pixels.
    pub cx: Real,
    /// Principal point Y coordinate in pixels.
    pub cy: Real,
}

impl LinearCamera {
    pub fn new(fx: Real, fy: Real, cx: Real, cy: Real) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Linear camera with a single focal length and the principal point at
    /// the center of a `width`×`height` pixel grid.
    pub fn centered(width: u32, height: u32, focal: Real) -> Self {
        Self {
            fx: focal,
            fy: focal,
            cx: (width as Real - 1.0) / 2.0,
            cy: (height as Real - 1.0) / 2.0,
        }
    }
}

impl CameraModel for LinearCamera {
    fn project(&self, p_c: &Vec3) -> Option<Vec2> {
        if p_c.z <= 0.0 {
            return None;
        }
        let u = self.fx * p_c.x / p_c.z + self.cx;
        let v = self.fy * p_c.y / p_c.z + self.cy;
        Some(Vec2::new(u, v))
    }

    fn unproject(&self, px: &Vec2) -> Vec3 {
        let dir = Vec3::new((px.x - self.cx) / self.fx, (px.y - self.cy) / self.fy, 1.0);
        dir / dir.norm()
    }
}
