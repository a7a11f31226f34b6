use qr_reader::{ECLevel, Encoder, GrayLuminanceSource};

/// A rendered symbol placed at (`left`, `top`) in a larger mid-grey frame
pub fn frame_with_code(
    text: &str,
    width: usize,
    height: usize,
    left: usize,
    top: usize,
    scale: usize,
) -> GrayLuminanceSource {
    let code = Encoder::encode(text, ECLevel::M).expect("bench payload encodes");
    let (symbol, size) = code.to_luma(scale, 4);
    let mut pixels = vec![180u8; width * height];
    for y in 0..size.min(height.saturating_sub(top)) {
        let row = &symbol[y * size..(y + 1) * size];
        let dst = (top + y) * width + left;
        let len = size.min(width.saturating_sub(left));
        pixels[dst..dst + len].copy_from_slice(&row[..len]);
    }
    GrayLuminanceSource::new(pixels, width, height).expect("frame dimensions")
}

/// Deterministic noise frame with no symbol in it
pub fn noise_frame(width: usize, height: usize) -> GrayLuminanceSource {
    let pixels = (0..width * height).map(|i| ((i * 7919) % 256) as u8).collect();
    GrayLuminanceSource::new(pixels, width, height).expect("frame dimensions")
}
