//! Modal state: everything the parser carries across statements.

use std::fmt;

/// Distance unit selected by `%MO...*%`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Mm,
    In,
}

/// Coordinate format selected by `%FSLAX<i><d>Y<i><d>*%`.
///
/// `int_digits` and `dec_digits` apply identically to X and Y, as required
/// by the format (`FSLAX` only; no other zero-suppression/notation variant
/// is accepted).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateFormat {
    pub int_digits: u8,
    pub dec_digits: u8,
}

/// A point in native (unscaled) coordinate units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// The running interpolation mode set by `G01`/`G02`/`G03`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Linear,
    CwCircular,
    CcwCircular,
}

impl Default for InterpolationMode {
    /// The format requires an explicit `G01` before any draw, but many
    /// real-world files omit it; `Linear` is the accepted default.
    fn default() -> Self {
        InterpolationMode::Linear
    }
}

/// Object polarity, set by `%LP...*%`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Dark,
    Clear,
}

impl Default for Polarity {
    fn default() -> Self {
        Polarity::Dark
    }
}

/// Mirroring axis, set by `%LM...*%`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    N,
    X,
    Y,
    Xy,
}

impl Default for Mirroring {
    fn default() -> Self {
        Mirroring::N
    }
}

/// The active graphics-state transform: polarity, mirroring, rotation, and
/// scaling, all recorded but never applied by the core (application is a
/// renderer concern, per the geometry collaborator contract).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphicsTransform {
    pub polarity: Polarity,
    pub mirroring: Mirroring,
    pub rotation: f64,
    pub scaling: f64,
}

impl Default for GraphicsTransform {
    fn default() -> Self {
        GraphicsTransform {
            polarity: Polarity::default(),
            mirroring: Mirroring::default(),
            rotation: 0.0,
            scaling: 1.0,
        }
    }
}

/// An aperture identifier: `D` followed by an integer `>= 10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApertureId(pub i64);

impl fmt::Display for ApertureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.0)
    }
}

/// Everything the parser carries forward from one statement to the next.
#[derive(Debug, Clone, Default)]
pub struct ModalState {
    pub format: Option<CoordinateFormat>,
    pub unit: Option<Unit>,
    pub current_point: Point,
    pub current_aperture: Option<ApertureId>,
    pub interpolation: InterpolationMode,
    pub transform: GraphicsTransform,
}
