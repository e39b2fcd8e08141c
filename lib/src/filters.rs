use crate::buffer::PixelBuffer;
use image::{ImageBuffer, Luma, Rgb};

/// Single-channel floating point image, values normally in [0, 1]
pub type LumaPlane = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Number of taps in the smoothing kernel
pub const GAUSSIAN_TAPS: usize = 5;

/// Luminance of a colour on the 0..=255 scale
///
/// Formula: L = 0.299*R + 0.587*G + 0.114*B (ITU-R BT.601, the usual
/// greyscale conversion for 8-bit photos)
#[inline]
pub fn luminance(color: Rgb<u8>) -> f32 {
    0.299 * color[0] as f32 + 0.587 * color[1] as f32 + 0.114 * color[2] as f32
}

/// Calculate a normalised luminance plane from an RGB buffer
///
/// # Returns
/// Plane with values in [0, 1]
pub fn calculate_luminance(buf: &PixelBuffer) -> LumaPlane {
    let (width, height) = buf.dimensions();
    LumaPlane::from_fn(width, height, |x, y| {
        Luma([(luminance(buf.pixel(x, y)) / 255.0).clamp(0.0, 1.0)])
    })
}

/// Calculate Gaussian weight for a given sigma and position
///
/// Formula: (1 / sqrt(2π σ²)) * exp(-(pos²) / (2σ²))
pub fn gaussian(sigma: f32, pos: f32) -> f32 {
    let two_pi = 2.0 * std::f32::consts::PI;
    let sigma_sq = sigma * sigma;

    (1.0 / (two_pi * sigma_sq).sqrt()) * (-pos * pos / (2.0 * sigma_sq)).exp()
}

/// Normalised 5-tap Gaussian kernel centred on index 2
pub fn gaussian_kernel(sigma: f32) -> [f32; GAUSSIAN_TAPS] {
    let radius = (GAUSSIAN_TAPS / 2) as i32;
    let mut kernel = [0.0; GAUSSIAN_TAPS];
    for (i, w) in kernel.iter_mut().enumerate() {
        *w = gaussian(sigma, (i as i32 - radius) as f32);
    }
    let sum: f32 = kernel.iter().sum();
    kernel.map(|w| w / sum)
}

/// Apply the horizontal pass of the separable blur
///
/// Samples past the edge are clamped to the nearest edge pixel.
pub fn gaussian_blur_h(img: &LumaPlane, kernel: &[f32; GAUSSIAN_TAPS]) -> LumaPlane {
    let (width, height) = img.dimensions();
    let radius = (GAUSSIAN_TAPS / 2) as i32;

    LumaPlane::from_fn(width, height, |x, y| {
        let mut sum = 0.0;
        for (i, weight) in kernel.iter().enumerate() {
            let offset = i as i32 - radius;
            let sample_x = (x as i32 + offset).clamp(0, width as i32 - 1) as u32;
            sum += img.get_pixel(sample_x, y)[0] * weight;
        }
        Luma([sum])
    })
}

/// Apply the vertical pass of the separable blur
pub fn gaussian_blur_v(img: &LumaPlane, kernel: &[f32; GAUSSIAN_TAPS]) -> LumaPlane {
    let (width, height) = img.dimensions();
    let radius = (GAUSSIAN_TAPS / 2) as i32;

    LumaPlane::from_fn(width, height, |x, y| {
        let mut sum = 0.0;
        for (i, weight) in kernel.iter().enumerate() {
            let offset = i as i32 - radius;
            let sample_y = (y as i32 + offset).clamp(0, height as i32 - 1) as u32;
            sum += img.get_pixel(x, sample_y)[0] * weight;
        }
        Luma([sum])
    })
}

/// Apply the full 2D 5-tap Gaussian blur
pub fn gaussian_blur(img: &LumaPlane, sigma: f32) -> LumaPlane {
    let kernel = gaussian_kernel(sigma);
    let temp = gaussian_blur_h(img, &kernel);
    gaussian_blur_v(&temp, &kernel)
}

/// Apply the Sobel operator
///
/// Gx (horizontal):     Gy (vertical):
/// [-1  0  1]           [-1 -2 -1]
/// [-2  0  2]           [ 0  0  0]
/// [-1  0  1]           [ 1  2  1]
///
/// # Returns
/// `(gx, gy)` planes. Border pixels have no full neighbourhood and stay 0.
pub fn sobel_gradients(img: &LumaPlane) -> (LumaPlane, LumaPlane) {
    let (width, height) = img.dimensions();
    let mut gx = LumaPlane::new(width, height);
    let mut gy = LumaPlane::new(width, height);

    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let nw = img.get_pixel(x - 1, y - 1)[0];
            let n = img.get_pixel(x, y - 1)[0];
            let ne = img.get_pixel(x + 1, y - 1)[0];
            let w = img.get_pixel(x - 1, y)[0];
            let e = img.get_pixel(x + 1, y)[0];
            let sw = img.get_pixel(x - 1, y + 1)[0];
            let s = img.get_pixel(x, y + 1)[0];
            let se = img.get_pixel(x + 1, y + 1)[0];

            gx.put_pixel(x, y, Luma([-nw + ne - 2.0 * w + 2.0 * e - sw + se]));
            gy.put_pixel(x, y, Luma([-nw - 2.0 * n - ne + sw + 2.0 * s + se]));
        }
    }

    (gx, gy)
}
