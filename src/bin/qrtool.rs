use clap::{Parser, Subcommand, ValueEnum};
use qr_reader::detector::finder::FinderPatternFinder;
use qr_reader::utils::binarization::BinaryBitmap;
use qr_reader::{
    Binarizer, DecodeHints, ECLevel, Encoder, GrayLuminanceSource, QrCodeReader, ResultMetadataValue,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "qrtool", version, about = "QR code reader CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum BinarizerArg {
    Hybrid,
    Histogram,
}

impl From<BinarizerArg> for Binarizer {
    fn from(arg: BinarizerArg) -> Self {
        match arg {
            BinarizerArg::Hybrid => Binarizer::Hybrid,
            BinarizerArg::Histogram => Binarizer::GlobalHistogram,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Decode the QR code in a single image
    Decode {
        #[arg(long)]
        image: PathBuf,
        /// Spend more time looking for the symbol
        #[arg(long)]
        try_harder: bool,
        /// The image is an unrotated symbol with nothing else in it
        #[arg(long)]
        pure: bool,
        /// Character set for byte segments without ECI
        #[arg(long)]
        charset: Option<String>,
        #[arg(long, value_enum, default_value = "hybrid")]
        binarizer: BinarizerArg,
    },
    /// Write text as a QR code PNG
    Encode {
        #[arg(long)]
        text: String,
        /// Error correction level (L, M, Q, H)
        #[arg(long, default_value = "M")]
        ec: ECLevel,
        /// Pixels per module
        #[arg(long, default_value_t = 4)]
        scale: usize,
        /// Light modules around the symbol
        #[arg(long, default_value_t = 4)]
        quiet_zone: usize,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print binarization stats and finder pattern candidates for an image
    DebugDetect {
        #[arg(long)]
        image: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Decode {
            image,
            try_harder,
            pure,
            charset,
            binarizer,
        } => {
            let mut hints = DecodeHints::new()
                .with_try_harder(try_harder)
                .with_pure_barcode(pure);
            if let Some(label) = charset {
                hints = hints.with_character_set(label);
            }
            decode_cmd(&image, &hints, binarizer.into())
        }
        Command::Encode {
            text,
            ec,
            scale,
            quiet_zone,
            out,
        } => encode_cmd(&text, ec, scale, quiet_zone, &out),
        Command::DebugDetect { image } => debug_detect_cmd(&image),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn load_source(path: &Path) -> Result<GrayLuminanceSource, String> {
    let image =
        image::open(path).map_err(|err| format!("Failed to load image {}: {err}", path.display()))?;
    Ok(GrayLuminanceSource::from_image(&image))
}

fn decode_cmd(path: &Path, hints: &DecodeHints, binarizer: Binarizer) -> Result<(), String> {
    let source = load_source(path)?;
    let reader = QrCodeReader::with_binarizer(binarizer);

    let start = Instant::now();
    let result = reader.decode(&source, hints);
    let elapsed = start.elapsed();

    println!("Image: {}", path.display());
    let result = result.map_err(|err| format!("Decode failed after {elapsed:.2?}: {err}"))?;
    println!("Decoded in {elapsed:.2?}");
    println!("Text: {}", result.text);
    for (key, value) in &result.metadata {
        match value {
            ResultMetadataValue::Text(text) => println!("  {key:?}: {text}"),
            ResultMetadataValue::Int(n) => println!("  {key:?}: {n}"),
            ResultMetadataValue::Bytes(segments) => {
                println!("  {key:?}: {} segment(s)", segments.len())
            }
        }
    }
    for (i, point) in result.result_points.iter().enumerate() {
        println!("  Point {i}: ({:.1}, {:.1})", point.x, point.y);
    }
    Ok(())
}

fn encode_cmd(text: &str, ec: ECLevel, scale: usize, quiet_zone: usize, out: &Path) -> Result<(), String> {
    let code = Encoder::encode(text, ec).map_err(|err| format!("Encode failed: {err}"))?;
    code.to_image(scale, quiet_zone)
        .save(out)
        .map_err(|err| format!("Failed to write {}: {err}", out.display()))?;
    println!(
        "Wrote {} (version {}, level {}, mask {})",
        out.display(),
        code.version().number(),
        code.ec_level(),
        code.mask_pattern().bits()
    );
    Ok(())
}

fn debug_detect_cmd(path: &Path) -> Result<(), String> {
    let source = load_source(path)?;
    let bitmap = BinaryBitmap::new(&source, Binarizer::Hybrid);
    println!("Image: {} ({}x{})", path.display(), bitmap.width(), bitmap.height());

    let binary = bitmap
        .black_matrix()
        .map_err(|err| format!("Binarization failed: {err}"))?;
    let total = binary.width() * binary.height();
    let black = binary.count_ones();
    println!(
        "Binary: black_pixels={black} total={total} black_ratio={:.2}%",
        black as f32 * 100.0 / total.max(1) as f32
    );

    let hints = DecodeHints::new().with_try_harder(true);
    let mut finder = FinderPatternFinder::new(binary, &hints);
    let info = finder.find();
    println!("Found {} finder pattern candidates", finder.possible_centers().len());
    for (i, pattern) in finder.possible_centers().iter().take(10).enumerate() {
        println!(
            "  Pattern {i}: center=({:.1}, {:.1}) module_size={:.2} count={}",
            pattern.x(),
            pattern.y(),
            pattern.module_size,
            pattern.count
        );
    }
    match info {
        Ok(info) => println!(
            "Best triple: top_left=({:.1}, {:.1}) top_right=({:.1}, {:.1}) bottom_left=({:.1}, {:.1})",
            info.top_left.x(),
            info.top_left.y(),
            info.top_right.x(),
            info.top_right.y(),
            info.bottom_left.x(),
            info.bottom_left.y()
        ),
        Err(err) => println!("No usable triple: {err}"),
    }
    Ok(())
}
