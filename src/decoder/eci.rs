//! Character sets selectable through ECI designators or the `character_set`
//! hint, and the heuristic used when neither is given.

use encoding_rs::{Encoding, SHIFT_JIS_INIT, UTF_8_INIT};

use crate::error::{QrError, Result};

/// A text encoding byte segments can be decoded with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// ISO-8859-1: every byte maps to the code point of the same value
    Latin1,
    /// Any encoding known to `encoding_rs`
    Encoding(&'static Encoding),
}

impl Charset {
    /// UTF-8
    pub const UTF8: Charset = Charset::Encoding(&UTF_8_INIT);
    /// Shift_JIS
    pub const SHIFT_JIS: Charset = Charset::Encoding(&SHIFT_JIS_INIT);

    /// Charset assigned to an ECI value, if any
    pub fn for_eci(value: u32) -> Option<Charset> {
        let label: &[u8] = match value {
            // Cp437 has no `encoding_rs` table; its printable ASCII range matches Latin-1
            0 | 2 => return Some(Charset::Latin1),
            1 | 3 => return Some(Charset::Latin1),
            4 => b"iso-8859-2",
            5 => b"iso-8859-3",
            6 => b"iso-8859-4",
            7 => b"iso-8859-5",
            8 => b"iso-8859-6",
            9 => b"iso-8859-7",
            10 => b"iso-8859-8",
            11 => b"iso-8859-9",
            12 => b"iso-8859-10",
            13 => b"iso-8859-11",
            15 => b"iso-8859-13",
            16 => b"iso-8859-14",
            17 => b"iso-8859-15",
            18 => b"iso-8859-16",
            20 => b"shift_jis",
            21 => b"windows-1250",
            22 => b"windows-1251",
            23 => b"windows-1252",
            24 => b"windows-1256",
            25 => b"utf-16be",
            26 => b"utf-8",
            27 | 170 => return Some(Charset::Latin1),
            28 => b"big5",
            29 => b"gb18030",
            30 => b"euc-kr",
            _ => return None,
        };
        Encoding::for_label(label).map(Charset::Encoding)
    }

    /// Charset for a label such as "UTF-8" or "Shift_JIS"
    pub fn for_label(label: &str) -> Result<Charset> {
        let normalized = label.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "iso-8859-1" | "iso8859_1" | "latin1" | "us-ascii" | "ascii" | "cp437" => {
                Ok(Charset::Latin1)
            }
            "sjis" => Ok(Charset::SHIFT_JIS),
            _ => Encoding::for_label(normalized.as_bytes())
                .map(Charset::Encoding)
                .ok_or_else(|| QrError::InvalidArgument(format!("unknown character set '{label}'"))),
        }
    }

    /// Decode bytes, replacing malformed sequences
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Charset::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            Charset::Encoding(encoding) => encoding
                .decode_without_bom_handling(bytes)
                .0
                .into_owned(),
        }
    }

    /// Encode text; `None` if a character is not representable
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        match self {
            Charset::Latin1 => text
                .chars()
                .map(|c| u8::try_from(c as u32).ok())
                .collect(),
            Charset::Encoding(encoding) => {
                let (bytes, _, had_errors) = encoding.encode(text);
                (!had_errors).then(|| bytes.into_owned())
            }
        }
    }
}

/// Pick the most plausible charset for an undeclared byte segment.
///
/// Order of preference: a UTF-8 BOM, valid UTF-8 with multi-byte sequences,
/// Shift_JIS with runs of double-byte or half-width katakana characters,
/// ISO-8859-1, then whichever of Shift_JIS or UTF-8 still validates.
pub fn guess_charset(bytes: &[u8], hint: Option<Charset>) -> Charset {
    if let Some(charset) = hint {
        return charset;
    }
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return Charset::UTF8;
    }

    let utf8 = std::str::from_utf8(bytes).ok();
    if utf8.is_some_and(|s| !s.is_ascii()) {
        return Charset::UTF8;
    }

    let mut can_be_latin1 = true;
    let mut iso_high_other = 0;
    for &b in bytes {
        if (0x80..0xA0).contains(&b) {
            can_be_latin1 = false;
        } else if b >= 0xC0 && b != 0xD7 && b != 0xF7 {
            iso_high_other += 1;
        }
    }

    let sjis = ShiftJisStats::scan(bytes);
    if let Some(stats) = sjis {
        if stats.max_katakana_run >= 3 || stats.max_double_byte_run >= 3 {
            return Charset::SHIFT_JIS;
        }
        if can_be_latin1
            && ((stats.max_katakana_run == 2 && stats.katakana_chars == 2)
                || iso_high_other * 10 >= bytes.len())
        {
            return Charset::SHIFT_JIS;
        }
    }
    if can_be_latin1 {
        return Charset::Latin1;
    }
    if sjis.is_some() {
        return Charset::SHIFT_JIS;
    }
    Charset::UTF8
}

#[derive(Debug, Clone, Copy, Default)]
struct ShiftJisStats {
    katakana_chars: usize,
    max_katakana_run: usize,
    max_double_byte_run: usize,
}

impl ShiftJisStats {
    /// Scan a byte string as Shift_JIS; `None` if it is not valid
    fn scan(bytes: &[u8]) -> Option<Self> {
        let mut stats = ShiftJisStats::default();
        let mut katakana_run = 0;
        let mut double_run = 0;
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            match b {
                0x80 | 0xA0 | 0xF0..=0xFF => return None,
                0xA1..=0xDF => {
                    stats.katakana_chars += 1;
                    katakana_run += 1;
                    stats.max_katakana_run = stats.max_katakana_run.max(katakana_run);
                    double_run = 0;
                    i += 1;
                }
                0x81..=0x9F | 0xE0..=0xEF => {
                    let trail = *bytes.get(i + 1)?;
                    if !(0x40..=0xFC).contains(&trail) || trail == 0x7F {
                        return None;
                    }
                    double_run += 1;
                    stats.max_double_byte_run = stats.max_double_byte_run.max(double_run);
                    katakana_run = 0;
                    i += 2;
                }
                _ => {
                    katakana_run = 0;
                    double_run = 0;
                    i += 1;
                }
            }
        }
        Some(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eci_lookup() {
        assert_eq!(Charset::for_eci(26), Some(Charset::UTF8));
        assert_eq!(Charset::for_eci(3), Some(Charset::Latin1));
        assert_eq!(Charset::for_eci(20), Some(Charset::SHIFT_JIS));
        assert!(Charset::for_eci(30).is_some());
        assert_eq!(Charset::for_eci(14), None);
        assert_eq!(Charset::for_eci(999), None);
    }

    #[test]
    fn test_label_lookup() {
        assert_eq!(Charset::for_label("UTF-8").unwrap(), Charset::UTF8);
        assert_eq!(Charset::for_label("ISO-8859-1").unwrap(), Charset::Latin1);
        assert!(matches!(
            Charset::for_label("klingon"),
            Err(QrError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_latin1_decode_is_identity() {
        assert_eq!(Charset::Latin1.decode(&[0x41, 0xE9, 0x80]), "A\u{e9}\u{80}");
    }

    #[test]
    fn test_guess() {
        assert_eq!(guess_charset(b"hello", None), Charset::Latin1);
        assert_eq!(guess_charset("h\u{e9}llo".as_bytes(), None), Charset::UTF8);
        assert_eq!(guess_charset(&[0x63, 0x61, 0x66, 0xE9], None), Charset::Latin1);
        // "日本語" in Shift_JIS
        assert_eq!(
            guess_charset(&[0x93, 0xFA, 0x96, 0x7B, 0x8C, 0xEA], None),
            Charset::SHIFT_JIS
        );
        assert_eq!(guess_charset(b"abc", Some(Charset::UTF8)), Charset::UTF8);
    }

    #[test]
    fn test_encode_roundtrip() {
        let bytes = Charset::SHIFT_JIS.encode("日本").unwrap();
        assert_eq!(Charset::SHIFT_JIS.decode(&bytes), "日本");
        assert_eq!(Charset::Latin1.encode("\u{3042}"), None);
    }
}
