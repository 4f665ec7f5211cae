//! Output writers for the solved pad ring.
//!
//! Each artifact (GDS2, SVG, DEF) is an append-only sink over the same
//! placement stream: the orchestrator feeds every placed cell to every
//! enabled writer through [`RingWriter`], then finishes them. Writers
//! own their sink exclusively and never reorder what they are given.

use anyhow::Result;
use core_layout::Placement;

pub mod def;
pub mod gds2;
pub mod svg;

pub use def::DefWriter;
pub use gds2::Gds2Writer;
pub use svg::SvgWriter;

/// An output sink consuming placed cells in stream order.
pub trait RingWriter {
    fn write_cell(&mut self, placement: &Placement) -> Result<()>;

    /// Complete the artifact and flush the sink. Call exactly once,
    /// after the last cell.
    fn finish(&mut self) -> Result<()>;
}
