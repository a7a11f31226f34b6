//! QR code decoding modules
//!
//! Everything after the module grid has been sampled:
//! - Format and version information extraction (BCH)
//! - Unmasking and codeword extraction
//! - Reed-Solomon error correction over GF(256)
//! - Bitstream parsing (numeric, alphanumeric, byte, kanji, hanzi, ECI)

/// BCH codeword tables and nearest-codeword search for format and version info
pub mod bch;
/// MSB-first bit reader over codeword bytes
pub mod bit_source;
/// Segment-by-segment bitstream parser
pub mod bitstream;
/// De-interleaving of codewords into Reed-Solomon blocks
pub mod data_block;
/// ECI designators and character sets
pub mod eci;
/// Format information extraction (mask pattern, EC level)
pub mod format;
/// Function module mask builder (finder/timing/format/alignment/version)
pub mod function_mask;
/// Galois field arithmetic
pub mod galois;
/// Data mode decoders
pub mod modes;
/// Reads format, version and codewords out of a sampled symbol
pub mod parser;
/// Main QR decoder that orchestrates the decoding pipeline
pub mod qr_decoder;
/// Reed-Solomon error correction
pub mod reed_solomon;
/// QR code unmasking (removes mask patterns)
pub mod unmask;
/// Version information extraction (versions 7-40)
pub mod version;
