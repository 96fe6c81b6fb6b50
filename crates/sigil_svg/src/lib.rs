//! Sigil SVG
//!
//! A streaming parser for a practical subset of SVG, producing a normalized
//! [`Icon`] document: a display list of resolved paths and style snapshots
//! with no backward references into the source markup. Drawing replays the
//! display list against any backend implementing the `sigil_core` driver
//! protocol.
//!
//! # Example
//!
//! ```ignore
//! use sigil_svg::{ErrorMode, Icon};
//!
//! let mut icon = Icon::from_file("icon.svg", ErrorMode::Warn)?;
//! icon.set_target(0.0, 0.0, 64.0, 64.0);
//! icon.draw(&mut driver, 1.0);
//! ```

pub mod cursor;
pub mod document;
pub mod error;
pub mod pathdata;
pub mod shapes;
pub mod style;
mod values;

pub use cursor::{Definition, IconCursor};
pub use document::{Icon, StyledPath, ViewBox};
pub use error::{ErrorMode, SvgError};
pub use pathdata::parse_path_data;
pub use style::{PaintValue, PathStyle};
