//! SVG document writing for the map.

mod path;
mod writer;

pub(crate) use path::*;
pub(crate) use writer::*;
