use image::RgbaImage;
use rayon::prelude::*;

/// Row-major 3x3 matrix applied to `[r, g, b]`.
pub type ColorMatrix = [[f32; 3]; 3];

/// `amount` 1.0 = identity, 0.0 = fully desaturated, above 1.0 over-saturates.
pub fn saturate_matrix(amount: f32) -> ColorMatrix {
    let s = amount;
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

/// `amount` in `0.0..=1.0`, 0.0 = identity.
pub fn grayscale_matrix(amount: f32) -> ColorMatrix {
    let g = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.2126 + 0.7874 * g, 0.7152 - 0.7152 * g, 0.0722 - 0.0722 * g],
        [0.2126 - 0.2126 * g, 0.7152 + 0.2848 * g, 0.0722 - 0.0722 * g],
        [0.2126 - 0.2126 * g, 0.7152 - 0.7152 * g, 0.0722 + 0.9278 * g],
    ]
}

/// `amount` in `0.0..=1.0`, 0.0 = identity.
pub fn sepia_matrix(amount: f32) -> ColorMatrix {
    let g = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * g, 0.769 - 0.769 * g, 0.189 - 0.189 * g],
        [0.349 - 0.349 * g, 0.686 + 0.314 * g, 0.168 - 0.168 * g],
        [0.272 - 0.272 * g, 0.534 - 0.534 * g, 0.131 + 0.869 * g],
    ]
}

pub fn hue_rotate_matrix(degrees: f32) -> ColorMatrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

/// Applies `m` to every pixel's color channels, clamping to 8 bits. Alpha is kept.
pub fn apply_matrix(img: &mut RgbaImage, m: &ColorMatrix) {
    img.par_chunks_exact_mut(4).for_each(|px| {
        let r = px[0] as f32;
        let g = px[1] as f32;
        let b = px[2] as f32;
        for (c, row) in m.iter().enumerate() {
            let v = row[0] * r + row[1] * g + row[2] * b;
            px[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    });
}

#[cfg(test)]
mod tests {
    use image::{ImageBuffer, Rgba, RgbaImage};

    use super::*;

    fn one_pixel(rgb: [u8; 3]) -> RgbaImage {
        ImageBuffer::from_pixel(1, 1, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    fn rgb(img: &RgbaImage) -> [u8; 3] {
        let p = img.get_pixel(0, 0).0;
        [p[0], p[1], p[2]]
    }

    fn filtered(rgb_in: [u8; 3], m: ColorMatrix) -> [u8; 3] {
        let mut img = one_pixel(rgb_in);
        apply_matrix(&mut img, &m);
        rgb(&img)
    }

    #[test]
    fn neutral_amounts_are_identity() {
        let px = [12, 140, 233];
        assert_eq!(filtered(px, saturate_matrix(1.0)), px);
        assert_eq!(filtered(px, grayscale_matrix(0.0)), px);
        assert_eq!(filtered(px, sepia_matrix(0.0)), px);
        assert_eq!(filtered(px, hue_rotate_matrix(0.0)), px);
        assert_eq!(filtered(px, hue_rotate_matrix(360.0)), px);
    }

    #[test]
    fn full_grayscale_equalizes_channels() {
        let out = filtered([255, 32, 32], grayscale_matrix(1.0));
        assert!(out[0].abs_diff(out[1]) <= 1 && out[1].abs_diff(out[2]) <= 1);
    }

    #[test]
    fn zero_saturation_matches_luma_gray() {
        let out = filtered([200, 40, 90], saturate_matrix(0.0));
        assert!(out[0].abs_diff(out[1]) <= 1 && out[1].abs_diff(out[2]) <= 1);
    }

    #[test]
    fn sepia_warms_gray() {
        let out = filtered([128, 128, 128], sepia_matrix(1.0));
        assert!(out[0] > out[1] && out[1] > out[2]);
    }

    #[test]
    fn hue_rotation_moves_red_toward_green() {
        let out = filtered([255, 0, 0], hue_rotate_matrix(120.0));
        assert!(out[1] > out[0]);
    }
}
