use std::fmt;
use std::str::FromStr;

use crate::error::TraceError;

/// Tracing parameters in one struct.
///
/// Plain data so callers can tweak a single knob with
/// `TraceParams { alphamax: 0.0, ..TraceParams::default() }`.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceParams {
    // -- Contour stage --
    /// How ambiguous diagonal crossings are resolved during boundary tracing.
    pub turn_policy: TurnPolicy,
    /// Contours enclosing fewer than this many pixels are dropped as speckles.
    pub speckle_size: u32,

    // -- Curve fitting --
    /// Corner threshold. Vertices with alpha >= alphamax become corners.
    /// 0 = every vertex is a corner (polygonal output), ~1.33 = no corners.
    pub alphamax: f64,
    /// Whether adjacent curve segments may be merged.
    pub opticurve: bool,
    /// Maximum deviation (in pixels) a merged curve may have from the
    /// polygon it replaces. 0 disables merging.
    pub opttolerance: f64,
}

impl Default for TraceParams {
    fn default() -> Self {
        Self {
            turn_policy: TurnPolicy::Majority,
            speckle_size: 2,
            alphamax: 1.0,
            opticurve: true,
            opttolerance: 0.2,
        }
    }
}

impl TraceParams {
    /// Reject tolerances that are negative or not finite.
    pub fn validate(&self) -> Result<(), TraceError> {
        check_tolerance("alphamax", self.alphamax)?;
        check_tolerance("opttolerance", self.opttolerance)?;
        Ok(())
    }

    /// Merging runs only when enabled and the tolerance is positive.
    pub(crate) fn merges_curves(&self) -> bool {
        self.opticurve && self.opttolerance > 0.0
    }
}

fn check_tolerance(name: &'static str, value: f64) -> Result<(), TraceError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TraceError::ToleranceOutOfRange { name, value })
    }
}

/// Resolution rule for the ambiguous checkerboard configuration met while
/// walking a boundary: foreground ahead-right, background ahead-left.
///
/// Turning right keeps the two diagonal foreground pixels connected,
/// turning left keeps the background pixels connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPolicy {
    /// Always connect foreground pixels.
    Black,
    /// Always connect background pixels.
    White,
    /// Always turn left.
    Left,
    /// Always turn right.
    Right,
    /// Connect the color that is locally less common.
    Minority,
    /// Connect the color that is locally more common.
    #[default]
    Majority,
}

impl TurnPolicy {
    pub const ALL: [TurnPolicy; 6] = [
        TurnPolicy::Black,
        TurnPolicy::White,
        TurnPolicy::Left,
        TurnPolicy::Right,
        TurnPolicy::Minority,
        TurnPolicy::Majority,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TurnPolicy::Black => "black",
            TurnPolicy::White => "white",
            TurnPolicy::Left => "left",
            TurnPolicy::Right => "right",
            TurnPolicy::Minority => "minority",
            TurnPolicy::Majority => "majority",
        }
    }
}

impl fmt::Display for TurnPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TurnPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "black" | "foreground" => Ok(TurnPolicy::Black),
            "white" | "background" => Ok(TurnPolicy::White),
            "left" => Ok(TurnPolicy::Left),
            "right" => Ok(TurnPolicy::Right),
            "minority" => Ok(TurnPolicy::Minority),
            "majority" => Ok(TurnPolicy::Majority),
            other => Err(format!(
                "unknown turn policy '{}' (expected one of: black, white, left, right, minority, majority)",
                other
            )),
        }
    }
}

/// Options for the image decoding adapter.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Threshold method for converting to binary.
    pub threshold: ThresholdMethod,
    /// If true, swap foreground and background after thresholding.
    pub invert: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            threshold: ThresholdMethod::Fixed(128),
            invert: false,
        }
    }
}

/// Threshold method for converting a grayscale image to binary.
/// Pixels darker than the threshold are foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMethod {
    /// Fixed brightness threshold (0-255).
    Fixed(u8),
    /// Otsu's method (automatic).
    Otsu,
}
