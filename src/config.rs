//! Per-call decode hints and process-wide tunables.
//!
//! Tunables are read from the environment once, on first use, and clamped
//! to a sane range.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::decoder::eci::Charset;
use crate::error::{QrError, Result};
use crate::models::{BarcodeFormat, Point};

/// Callback receiving every candidate pattern centre the detector finds
pub type ResultPointCallback = Arc<dyn Fn(Point) + Send + Sync>;

/// Caller preferences for one decode attempt
#[derive(Clone, Default)]
pub struct DecodeHints {
    /// Formats the caller is looking for; `None` means any
    pub possible_formats: Option<Vec<BarcodeFormat>>,
    /// Spend more time for a better chance of success
    pub try_harder: bool,
    /// Character set for byte segments without an ECI designator
    pub character_set: Option<String>,
    /// The image is a clean, unrotated symbol with a quiet zone and nothing else
    pub pure_barcode: bool,
    /// Observer for candidate pattern centres
    pub result_point_callback: Option<ResultPointCallback>,
}

impl DecodeHints {
    /// Hints with every option off
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every row instead of skipping by the expected module size
    pub fn with_try_harder(mut self, try_harder: bool) -> Self {
        self.try_harder = try_harder;
        self
    }

    /// The image holds only an unrotated symbol and its quiet zone
    pub fn with_pure_barcode(mut self, pure_barcode: bool) -> Self {
        self.pure_barcode = pure_barcode;
        self
    }

    /// Charset for byte segments not covered by an ECI, by name
    pub fn with_character_set(mut self, label: impl Into<String>) -> Self {
        self.character_set = Some(label.into());
        self
    }

    /// Restrict the formats the caller will accept
    pub fn with_possible_formats(mut self, formats: Vec<BarcodeFormat>) -> Self {
        self.possible_formats = Some(formats);
        self
    }

    /// Observe every candidate pattern centre during detection
    pub fn with_result_point_callback(
        mut self,
        callback: impl Fn(Point) + Send + Sync + 'static,
    ) -> Self {
        self.result_point_callback = Some(Arc::new(callback));
        self
    }

    /// Resolve `character_set` to a [`Charset`]
    pub fn charset(&self) -> Result<Option<Charset>> {
        self.character_set
            .as_deref()
            .map(Charset::for_label)
            .transpose()
    }

    /// Check that the hints ask for QR codes at all.
    ///
    /// An empty format list is a caller error; a list without
    /// [`BarcodeFormat::QrCode`] means there is nothing for this reader to find.
    pub fn check_formats(&self) -> Result<()> {
        match self.possible_formats.as_deref() {
            None => Ok(()),
            Some([]) => Err(QrError::InvalidArgument(
                "possible_formats is empty".to_string(),
            )),
            Some(formats) if formats.contains(&BarcodeFormat::QrCode) => Ok(()),
            Some(_) => Err(QrError::NotFound),
        }
    }

    pub(crate) fn found_point(&self, point: Point) {
        if let Some(callback) = &self.result_point_callback {
            callback(point);
        }
    }
}

impl fmt::Debug for DecodeHints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeHints")
            .field("possible_formats", &self.possible_formats)
            .field("try_harder", &self.try_harder)
            .field("character_set", &self.character_set)
            .field("pure_barcode", &self.pure_barcode)
            .field(
                "result_point_callback",
                &self.result_point_callback.as_ref().map(|_| "<fn>"),
            )
            .finish()
    }
}

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

static ALIGNMENT_ALLOWANCE_START: OnceLock<usize> = OnceLock::new();

/// First alignment search radius, in modules
pub(crate) fn alignment_allowance_start() -> usize {
    *ALIGNMENT_ALLOWANCE_START
        .get_or_init(|| parse_env_usize("QR_ALIGNMENT_ALLOWANCE_START", 4).clamp(1, 16))
}

static ALIGNMENT_ALLOWANCE_MAX: OnceLock<usize> = OnceLock::new();

/// Largest alignment search radius, in modules; the radius doubles up to it
pub(crate) fn alignment_allowance_max() -> usize {
    *ALIGNMENT_ALLOWANCE_MAX.get_or_init(|| {
        parse_env_usize("QR_ALIGNMENT_ALLOWANCE_MAX", 16).clamp(alignment_allowance_start(), 64)
    })
}

static PARALLEL_GRAYSCALE_MIN_PIXELS: OnceLock<usize> = OnceLock::new();

/// Frames with at least this many pixels are converted to luma on the rayon pool
pub(crate) fn parallel_grayscale_min_pixels() -> usize {
    *PARALLEL_GRAYSCALE_MIN_PIXELS.get_or_init(|| {
        parse_env_usize("QR_PARALLEL_GRAYSCALE_MIN_PIXELS", 1 << 20).max(1)
    })
}
