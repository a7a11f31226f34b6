#![allow(dead_code)]

use qr_reader::{BitMatrix, ECLevel, Encoder, GrayLuminanceSource, QrCode};

pub const WHITE: u8 = 255;

pub fn encode(text: &str, level: ECLevel) -> QrCode {
    Encoder::encode(text, level).expect("test payload fits in a symbol")
}

/// Render a symbol upright with `quiet_zone` light modules on every side
pub fn render(code: &QrCode, scale: usize, quiet_zone: usize) -> GrayLuminanceSource {
    let (pixels, side) = code.to_luma(scale, quiet_zone);
    GrayLuminanceSource::new(pixels, side, side).expect("rendered frame is square")
}

/// Render a symbol and rotate it by `degrees` about its centre onto a white
/// canvas large enough to hold every corner.
pub fn render_rotated(code: &QrCode, scale: usize, quiet_zone: usize, degrees: f32) -> GrayLuminanceSource {
    let (pixels, side) = code.to_luma(scale, quiet_zone);
    let (sin, cos) = degrees.to_radians().sin_cos();
    let canvas = (side as f32 * (cos.abs() + sin.abs())).ceil() as usize + 2 * scale;

    let src_center = side as f32 / 2.0;
    let dst_center = canvas as f32 / 2.0;
    let mut out = vec![WHITE; canvas * canvas];
    for y in 0..canvas {
        for x in 0..canvas {
            // Inverse rotation back into the upright render
            let dx = x as f32 + 0.5 - dst_center;
            let dy = y as f32 + 0.5 - dst_center;
            let sx = cos * dx + sin * dy + src_center;
            let sy = -sin * dx + cos * dy + src_center;
            if sx >= 0.0 && sy >= 0.0 && (sx as usize) < side && (sy as usize) < side {
                out[y * canvas + x] = pixels[sy as usize * side + sx as usize];
            }
        }
    }
    GrayLuminanceSource::new(out, canvas, canvas).expect("canvas is square")
}

/// Paste an upright render into a larger frame of uniform `background`
pub fn render_in_frame(
    code: &QrCode,
    scale: usize,
    frame: (usize, usize),
    offset: (usize, usize),
    background: u8,
) -> GrayLuminanceSource {
    let (pixels, side) = code.to_luma(scale, 4);
    let (width, height) = frame;
    let (left, top) = offset;
    assert!(left + side <= width && top + side <= height, "symbol must fit the frame");

    let mut out = vec![background; width * height];
    for y in 0..side {
        let dst = (top + y) * width + left;
        out[dst..dst + side].copy_from_slice(&pixels[y * side..(y + 1) * side]);
    }
    GrayLuminanceSource::new(out, width, height).expect("frame dimensions")
}

/// Flip every listed module, given as (x, y)
pub fn flip_modules(bits: &mut BitMatrix, modules: &[(usize, usize)]) {
    for &(x, y) in modules {
        bits.flip(x, y);
    }
}

/// Module positions of the low `count` bits of both format information copies.
///
/// The first copy keeps its low bits in column 8 next to the top-left
/// finder, the second along row 8 under the top-right finder.
pub fn low_format_modules(dimension: usize, count: usize) -> Vec<(usize, usize)> {
    let mut modules = Vec::with_capacity(2 * count);
    for bit in 0..count {
        modules.push((8, bit));
        modules.push((dimension - 1 - bit, 8));
    }
    modules
}

/// One module inside each of the first seven codewords of a version 1 symbol.
///
/// Codewords fill the rightmost column pair bottom-up in 2x4 blocks, then the
/// next pair top-down.
pub const VERSION_1_CODEWORD_MODULES: [(usize, usize); 7] =
    [(20, 20), (20, 16), (20, 12), (18, 9), (18, 13), (18, 17), (16, 20)];
