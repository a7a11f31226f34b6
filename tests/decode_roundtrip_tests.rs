//! Property tests: anything the encoder produces, the decoder reads back.

mod common;

use proptest::prelude::*;
use qr_reader::decoder::qr_decoder::QrDecoder;
use qr_reader::{DecodeHints, ECLevel, Encoder, QrCodeReader};

fn ec_level() -> impl Strategy<Value = ECLevel> {
    prop_oneof![
        Just(ECLevel::L),
        Just(ECLevel::M),
        Just(ECLevel::Q),
        Just(ECLevel::H),
    ]
}

fn decode_symbol(text: &str, level: ECLevel) -> String {
    let code = Encoder::encode(text, level).expect("payload fits");
    QrDecoder::new()
        .decode(code.matrix().clone(), &DecodeHints::new())
        .expect("clean symbol decodes")
        .text
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn numeric_round_trip(text in "[0-9]{1,200}", level in ec_level()) {
        prop_assert_eq!(decode_symbol(&text, level), text);
    }

    #[test]
    fn alphanumeric_round_trip(text in "[0-9A-Z $%*+./:-]{1,150}", level in ec_level()) {
        prop_assert_eq!(decode_symbol(&text, level), text);
    }

    #[test]
    fn byte_round_trip(text in "[ -~]{1,120}", level in ec_level()) {
        prop_assert_eq!(decode_symbol(&text, level), text);
    }

    #[test]
    fn unicode_round_trip(text in "\\PC{1,40}", level in ec_level()) {
        prop_assert_eq!(decode_symbol(&text, level), text);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn rendered_round_trip(text in "[A-Za-z0-9 ]{1,60}", level in ec_level(), scale in 3usize..6) {
        let code = Encoder::encode(&text, level).expect("payload fits");
        let source = common::render(&code, scale, 4);
        let result = QrCodeReader::new()
            .decode(&source, &DecodeHints::new())
            .expect("rendered symbol decodes");
        prop_assert_eq!(&result.text, &text);
        prop_assert_eq!(result.errors_corrected(), Some(0));
    }
}
