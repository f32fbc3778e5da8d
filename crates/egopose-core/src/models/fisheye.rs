use serde::{Deserialize, Serialize};

use super::CameraModel;
use crate::{Real, Vec2, Vec3};

/// Number of projection parameters in the exported calibration layout.
pub const FISHEYE_PARAM_COUNT: usize = 15;

const EPS: Real = 1e-9;
const UNDISTORT_ITERS: usize = 10;
const THETA_ITERS: usize = 10;

/// Wide-field fisheye model with radial, tangential and thin-prism terms.
///
/// Parameter layout matches the `Projection.Params` list of the exported
/// device-calibration JSON: `[f, cx, cy, k0..k5, p0, p1, s0..s3]` with a
/// single focal length shared by both axes.
///
/// Projection maps a direction at polar angle θ from the optical axis to the
/// radius `θ·(1 + k0·θ² + … + k5·θ¹²)` in normalized coordinates, then adds
/// tangential `(p0, p1)` and thin-prism `(s0..s3)` terms before the focal
/// scaling.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FisheyeRadTanThinPrism {
    /// Focal length in pixels (both axes).
    pub f: Real,
    /// Principal point X coordinate in pixels.
    pub cx: Real,
    /// Principal point Y coordinate in pixels.
    pub cy: Real,
    /// Radial θ-polynomial coefficients.
    pub k: [Real; 6],
    /// Tangential coefficients.
    pub p: [Real; 2],
    /// Thin-prism coefficients.
    pub s: [Real; 4],
}

impl FisheyeRadTanThinPrism {
    /// Build the model from the flat calibration parameter list.
    ///
    /// Returns `None` unless exactly [`FISHEYE_PARAM_COUNT`] parameters are
    /// given.
    pub fn from_params(params: &[Real]) -> Option<Self> {
        if params.len() != FISHEYE_PARAM_COUNT {
            return None;
        }
        let mut k = [0.0; 6];
        k.copy_from_slice(&params[3..9]);
        let mut p = [0.0; 2];
        p.copy_from_slice(&params[9..11]);
        let mut s = [0.0; 4];
        s.copy_from_slice(&params[11..15]);
        Some(Self {
            f: params[0],
            cx: params[1],
            cy: params[2],
            k,
            p,
            s,
        })
    }

    /// Distorted radius for polar angle `theta`.
    fn theta_radial(&self, theta: Real) -> Real {
        let t2 = theta * theta;
        let mut poly = 0.0;
        for k in self.k.iter().rev() {
            poly = (poly + k) * t2;
        }
        theta * (1.0 + poly)
    }

    fn theta_radial_deriv(&self, theta: Real) -> Real {
        let t2 = theta * theta;
        let mut pow = t2;
        let mut d = 1.0;
        for (i, k) in self.k.iter().enumerate() {
            d += (2 * i + 3) as Real * k * pow;
            pow *= t2;
        }
        d
    }

    /// Add tangential and thin-prism terms to radially distorted coordinates.
    fn distort(&self, n: &Vec2) -> Vec2 {
        let r2 = n.norm_squared();
        let r4 = r2 * r2;
        let dot = n.x * self.p[0] + n.y * self.p[1];
        Vec2::new(
            n.x + 2.0 * dot * n.x + r2 * self.p[0] + self.s[0] * r2 + self.s[1] * r4,
            n.y + 2.0 * dot * n.y + r2 * self.p[1] + self.s[2] * r2 + self.s[3] * r4,
        )
    }

    /// Invert [`Self::distort`] by fixed-point iteration.
    fn undistort(&self, n_dist: &Vec2) -> Vec2 {
        let mut n = *n_dist;
        for _ in 0..UNDISTORT_ITERS {
            let e = self.distort(&n) - n;
            n = *n_dist - e;
        }
        n
    }

    /// Solve `theta_radial(θ) = radius` by Newton iteration.
    fn solve_theta(&self, radius: Real) -> Real {
        let mut theta = radius;
        for _ in 0..THETA_ITERS {
            let step = (self.theta_radial(theta) - radius) / self.theta_radial_deriv(theta);
            theta -= step;
            if step.abs() < 1e-14 {
                break;
            }
        }
        theta
    }
}

impl CameraModel for FisheyeRadTanThinPrism {
    fn project(&self, p_c: &Vec3) -> Option<Vec2> {
        if p_c.z <= 0.0 {
            return None;
        }
        let r = (p_c.x * p_c.x + p_c.y * p_c.y).sqrt();
        let uv = if r < EPS {
            // On-axis limit: distortion terms vanish with the radius.
            Vec2::new(p_c.x / p_c.z, p_c.y / p_c.z)
        } else {
            let theta = r.atan2(p_c.z);
            let scale = self.theta_radial(theta) / r;
            self.distort(&Vec2::new(scale * p_c.x, scale * p_c.y))
        };
        Some(Vec2::new(self.f * uv.x + self.cx, self.f * uv.y + self.cy))
    }

    fn unproject(&self, px: &Vec2) -> Vec3 {
        let uv = Vec2::new((px.x - self.cx) / self.f, (px.y - self.cy) / self.f);
        let xr_yr = self.undistort(&uv);
        let rd = xr_yr.norm();
        let dir = if rd < EPS {
            Vec3::new(xr_yr.x, xr_yr.y, 1.0)
        } else {
            let theta = self.solve_theta(rd);
            let t = theta.tan() / rd;
            Vec3::new(t * xr_yr.x, t * xr_yr.y, 1.0)
        };
        dir / dir.norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ideal_equidistant(f: Real) -> FisheyeRadTanThinPrism {
        let mut params = [0.0; FISHEYE_PARAM_COUNT];
        params[0] = f;
        params[1] = 255.5;
        params[2] = 255.5;
        FisheyeRadTanThinPrism::from_params(&params).unwrap()
    }

    #[test]
    fn from_params_requires_exact_count() {
        assert!(FisheyeRadTanThinPrism::from_params(&[0.0; 14]).is_none());
        assert!(FisheyeRadTanThinPrism::from_params(&[0.0; 16]).is_none());
        assert!(FisheyeRadTanThinPrism::from_params(&[0.0; 15]).is_some());
    }

    #[test]
    fn optical_axis_hits_principal_point() {
        let cam = ideal_equidistant(200.0);
        let px = cam.project(&Vec3::new(0.0, 0.0, 2.0)).unwrap();
        assert!((px - Vec2::new(255.5, 255.5)).norm() < 1e-9);
    }

    #[test]
    fn equidistant_radius_is_f_theta() {
        let cam = ideal_equidistant(200.0);
        // 45 degrees off-axis along +x.
        let px = cam.project(&Vec3::new(1.0, 0.0, 1.0)).unwrap();
        let expected = 200.0 * std::f64::consts::FRAC_PI_4;
        assert!((px.x - 255.5 - expected).abs() < 1e-9, "px={px:?}");
        assert!((px.y - 255.5).abs() < 1e-9);
    }

    #[test]
    fn behind_camera_does_not_project() {
        let cam = ideal_equidistant(200.0);
        assert!(cam.project(&Vec3::new(0.3, 0.1, -1.0)).is_none());
    }

    #[test]
    fn serde_roundtrip_keeps_parameters() {
        let params = [
            240.0, 255.5, 255.5, 0.02, -0.01, 0.004, -0.001, 0.0002, 0.0, 1e-4, -2e-4, 1e-4,
            0.0, -1e-4, 0.0,
        ];
        let cam = FisheyeRadTanThinPrism::from_params(&params).unwrap();
        let json = serde_json::to_string(&cam).unwrap();
        let de: FisheyeRadTanThinPrism = serde_json::from_str(&json).unwrap();
        assert_eq!(de.f, cam.f);
        assert_eq!(de.k, cam.k);
        assert_eq!(de.s, cam.s);
    }

    #[test]
    fn distort_undistort_roundtrip() {
        let params = [
            240.0, 255.5, 255.5, 0.02, -0.01, 0.004, -0.001, 0.0002, 0.0, 1e-4, -2e-4, 1e-4,
            0.0, -1e-4, 0.0,
        ];
        let cam = FisheyeRadTanThinPrism::from_params(&params).unwrap();
        let n = Vec2::new(0.6, -0.8);
        let back = cam.undistort(&cam.distort(&n));
        assert!((back - n).norm() < 1e-10);
    }
}
