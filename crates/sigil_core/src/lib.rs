//! Sigil Core
//!
//! Foundation types for the Sigil vector-icon pipeline:
//!
//! - **Geometry**: fixed-point points and the closed five-operation path model
//! - **Transform**: immutable 2D affine matrices with fixed-point helpers
//! - **Paint**: colors, gradients and the resolved paint handed to backends
//! - **Driver Protocol**: the traits a rasterizing backend implements
//!
//! The crate is backend-agnostic: geometry production is decoupled from pixel
//! rasterization through the driver protocol, so any scanline filler can
//! consume the same path stream. A [`driver::RecordingDriver`] is included
//! for tests and debugging.

pub mod driver;
pub mod geom;
pub mod paint;
pub mod transform;

pub use driver::{
    CapStyle, DashOptions, Driver, Filler, GapStyle, JoinOptions, JoinStyle, PathSink,
    RecordedOp, RecordingDriver, RecordingHandle, StrokeOptions, Stroker,
};
pub use geom::{Fixed, Path, PathOp, Point};
pub use paint::{Color, Gradient, GradientKind, GradientStop, GradientUnits, Paint, Rect, Spread};
pub use transform::Matrix2D;
