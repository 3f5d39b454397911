use image::RgbaImage;
use rayon::prelude::*;

/// Multiplies every color channel by `amount` (1.0 = identity).
pub fn brightness(img: &mut RgbaImage, amount: f32) {
    if (amount - 1.0).abs() < 0.001 {
        return;
    }
    apply_lut(img, &build_lut(|v| v * amount));
}

/// Scales channels away from (or toward) mid-gray by `amount` (1.0 = identity).
pub fn contrast(img: &mut RgbaImage, amount: f32) {
    if (amount - 1.0).abs() < 0.001 {
        return;
    }
    let intercept = 0.5 - 0.5 * amount;
    apply_lut(img, &build_lut(|v| v * amount + intercept));
}

fn build_lut(transfer: impl Fn(f32) -> f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, out) in lut.iter_mut().enumerate() {
        let v = transfer(i as f32 / 255.0).clamp(0.0, 1.0);
        *out = (v * 255.0).round() as u8;
    }
    lut
}

fn apply_lut(img: &mut RgbaImage, lut: &[u8; 256]) {
    img.par_chunks_exact_mut(4).for_each(|px| {
        px[0] = lut[px[0] as usize];
        px[1] = lut[px[1] as usize];
        px[2] = lut[px[2] as usize];
    });
}

#[cfg(test)]
mod tests {
    use image::{ImageBuffer, Rgba, RgbaImage};

    use super::{brightness, contrast};

    fn one_pixel(rgba: [u8; 4]) -> RgbaImage {
        ImageBuffer::from_pixel(1, 1, Rgba(rgba))
    }

    #[test]
    fn brightness_scales_and_saturates() {
        let mut img = one_pixel([100, 200, 0, 255]);
        brightness(&mut img, 1.5);
        assert_eq!(img.get_pixel(0, 0).0, [150, 255, 0, 255]);
    }

    #[test]
    fn zero_brightness_is_black_with_alpha_kept() {
        let mut img = one_pixel([100, 200, 50, 77]);
        brightness(&mut img, 0.0);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 77]);
    }

    #[test]
    fn contrast_pushes_away_from_mid_gray() {
        let mut img = one_pixel([64, 191, 128, 255]);
        contrast(&mut img, 2.0);
        let px = img.get_pixel(0, 0).0;
        assert!(px[0] < 64);
        assert!(px[1] > 191);
        assert!((px[2] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn zero_contrast_is_flat_gray() {
        let mut img = one_pixel([0, 255, 30, 255]);
        contrast(&mut img, 0.0);
        assert_eq!(img.get_pixel(0, 0).0, [128, 128, 128, 255]);
    }
}
