//! Packing of real and complex fields into 8-bit image channels.
//!
//! Every path clamps before quantizing: scalars to [0, 1], complex values to
//! the closed unit disk. Quantization is `floor(x * 255 + 0.5)`.

use image::{GrayImage, Luma, Rgba, RgbaImage};
use num_complex::Complex64;

use super::ExportError;
use crate::grid::Grid2;
use crate::weight::normalize_weights;

/// Quantizes a value in [0, 1] to a byte. Values outside are clamped and NaN
/// maps to 0.
#[inline]
pub fn quantize_unit(x: f64) -> u8 {
    if x.is_nan() {
        return 0;
    }
    (x.clamp(0.0, 1.0) * 255.0 + 0.5).floor() as u8
}

/// Inverse of [`quantize_unit`] up to quantization error.
#[inline]
pub fn dequantize_unit(v: u8) -> f64 {
    v as f64 / 255.0
}

/// Scales `z` back onto the unit circle if its magnitude exceeds 1.
#[inline]
pub fn clamp_to_unit_disk(z: Complex64) -> Complex64 {
    let n = z.norm();
    if n > 1.0 { z / n } else { z }
}

/// Maps a complex value in the unit disk to `(re', im')` in [0, 1]².
#[inline]
pub fn complex_to_unit_pair(z: Complex64) -> (f64, f64) {
    let z = clamp_to_unit_disk(z);
    (0.5 + 0.5 * z.re, 0.5 + 0.5 * z.im)
}

/// Decodes the red/green channels of a complex layer pixel.
#[inline]
pub fn decode_complex(pixel: [u8; 4]) -> Complex64 {
    Complex64::new(
        (dequantize_unit(pixel[0]) - 0.5) * 2.0,
        (dequantize_unit(pixel[1]) - 0.5) * 2.0,
    )
}

#[inline]
fn rg_pixel(r: f64, g: f64) -> Rgba<u8> {
    Rgba([quantize_unit(r), quantize_unit(g), 0, 255])
}

fn check_same_shape<A, B>(a: &Grid2<A>, b: &Grid2<B>) -> Result<(), ExportError> {
    if a.dimensions() != b.dimensions() {
        return Err(ExportError::DimensionMismatch(a.width(), a.height(), b.width(), b.height()));
    }
    Ok(())
}

/// Encodes a scalar field as 8-bit grayscale.
pub fn encode_gray(field: &Grid2<f64>) -> GrayImage {
    GrayImage::from_fn(field.width(), field.height(), |x, y| {
        Luma([quantize_unit(*field.get(x, y))])
    })
}

/// Packs two scalar fields into the red and green channels of an RGBA image.
///
/// Blue is left at 0 and alpha is fully opaque.
pub fn encode_rg(red: &Grid2<f64>, green: &Grid2<f64>) -> Result<RgbaImage, ExportError> {
    check_same_shape(red, green)?;
    Ok(RgbaImage::from_fn(red.width(), red.height(), |x, y| {
        rg_pixel(*red.get(x, y), *green.get(x, y))
    }))
}

/// Encodes a complex field: real part to red, imaginary part to green.
pub fn encode_complex(field: &Grid2<Complex64>) -> RgbaImage {
    RgbaImage::from_fn(field.width(), field.height(), |x, y| {
        let (re, im) = complex_to_unit_pair(*field.get(x, y));
        rg_pixel(re, im)
    })
}

/// Normalizes raw weights over the mask, then encodes them as grayscale.
pub fn encode_weight(raw: &Grid2<f64>, mask: &Grid2<bool>) -> Result<GrayImage, ExportError> {
    check_same_shape(raw, mask)?;
    Ok(encode_gray(&normalize_weights(raw, mask)))
}
