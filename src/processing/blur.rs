use image::{DynamicImage, RgbaImage};
use imageproc::filter::gaussian_blur_f32;

/// Gaussian blur with standard deviation `sigma` pixels. Blurs alpha too.
///
/// Both passes run on float samples; the result is quantized to 8 bits once.
pub fn gaussian(img: RgbaImage, sigma: f32) -> RgbaImage {
    if sigma < 0.01 || img.width() == 0 || img.height() == 0 {
        return img;
    }
    let linear = DynamicImage::ImageRgba8(img).into_rgba32f();
    let blurred = gaussian_blur_f32(&linear, sigma);
    DynamicImage::ImageRgba32F(blurred).into_rgba8()
}
