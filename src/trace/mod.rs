//! Position traces
//!
//! One text line per frame. Each particle is an `x y` field with ten decimal
//! places; fields are separated by a configurable delimiter (`;` by default)
//! and there is no header.

pub mod reader;
pub mod writer;

pub use reader::{FrameReader, parse_point};
pub use writer::{FrameWriter, format_point};
