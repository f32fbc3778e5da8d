//! Model-to-model image remapping.

use image::RgbImage;
use rayon::prelude::*;

use crate::{CameraModel, Real, Vec2};

/// Bilinearly sample `img` at fractional pixel coordinates.
///
/// Returns `None` when the 2×2 support leaves the image; the caller decides
/// the border value.
fn sample_bilinear(img: &RgbImage, x: Real, y: Real) -> Option<[u8; 3]> {
    let x0 = x.floor();
    let y0 = y.floor();
    if x0 < 0.0 || y0 < 0.0 {
        return None;
    }
    let (x0, y0) = (x0 as u32, y0 as u32);
    let (x1, y1) = (x0 + 1, y0 + 1);
    if x1 >= img.width() || y1 >= img.height() {
        return None;
    }

    let fx = x - x0 as Real;
    let fy = y - y0 as Real;

    let v00 = img.get_pixel(x0, y0).0;
    let v10 = img.get_pixel(x1, y0).0;
    let v01 = img.get_pixel(x0, y1).0;
    let v11 = img.get_pixel(x1, y1).0;

    let mut out = [0u8; 3];
    for c in 0..3 {
        let v0 = v00[c] as Real * (1.0 - fx) + v10[c] as Real * fx;
        let v1 = v01[c] as Real * (1.0 - fx) + v11[c] as Real * fx;
        out[c] = (v0 * (1.0 - fy) + v1 * fy).round().clamp(0.0, 255.0) as u8;
    }
    Some(out)
}

/// Resample `src` from the image plane of `src_model` onto the image plane
/// of `dst_model`.
///
/// Every target pixel is unprojected through `dst_model`, projected through
/// `src_model` and bilinearly sampled; rays that miss the source image come
/// out black. Rows are processed in parallel.
pub fn remap_between<S, D>(
    src: &RgbImage,
    src_model: &S,
    dst_model: &D,
    width: u32,
    height: u32,
) -> RgbImage
where
    S: CameraModel + Sync,
    D: CameraModel + Sync,
{
    let mut buf = vec![0u8; (width * height * 3) as usize];

    buf.par_chunks_mut(width as usize * 3)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width as usize {
                let px = Vec2::new(x as Real, y as Real);
                let ray = dst_model.unproject(&px);
                let rgb = src_model
                    .project(&ray)
                    .and_then(|sp| sample_bilinear(src, sp.x, sp.y))
                    .unwrap_or([0, 0, 0]);
                row[x * 3..x * 3 + 3].copy_from_slice(&rgb);
            }
        });

    RgbImage::from_raw(width, height, buf).expect("buffer sized to width*height*3")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinearCamera;
    use image::Rgb;

    #[test]
    fn identity_remap_keeps_pixels() {
        let mut img = RgbImage::new(32, 32);
        img.put_pixel(7, 11, Rgb([200, 40, 90]));
        img.put_pixel(20, 3, Rgb([13, 255, 8]));

        let cam = LinearCamera::centered(32, 32, 40.0);
        let out = remap_between(&img, &cam, &cam, 32, 32);

        assert_eq!(out.get_pixel(7, 11).0, [200, 40, 90]);
        assert_eq!(out.get_pixel(20, 3).0, [13, 255, 8]);
    }

    #[test]
    fn output_has_requested_dimensions() {
        let img = RgbImage::new(64, 48);
        let src = LinearCamera::centered(64, 48, 30.0);
        let dst = LinearCamera::centered(512, 512, 150.0);
        let out = remap_between(&img, &src, &dst, 512, 512);
        assert_eq!((out.width(), out.height()), (512, 512));
    }

    #[test]
    fn rays_outside_source_come_out_black() {
        let mut img = RgbImage::new(16, 16);
        for p in img.pixels_mut() {
            *p = Rgb([255, 255, 255]);
        }
        // A much wider target view than the source covers.
        let src = LinearCamera::centered(16, 16, 20.0);
        let dst = LinearCamera::centered(64, 64, 40.0);
        let out = remap_between(&img, &src, &dst, 64, 64);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(32, 32).0, [255, 255, 255]);
    }
}
