//! Export module: channel encoding and PNG output.
//!
//! Fields are clamped and quantized into 8-bit grayscale or RGBA images,
//! then written as PNG.

mod encode;
mod png;

pub use encode::{
    clamp_to_unit_disk, complex_to_unit_pair, decode_complex, dequantize_unit, encode_complex,
    encode_gray, encode_rg, encode_weight, quantize_unit,
};
pub use png::{write_gray_png, write_rgba_png, ExportError, PngOptions};
