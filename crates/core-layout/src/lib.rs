//! Pad ring layout core: the side models, the placement solver, filler
//! packing, and the orientation algebra shared by every output writer.
//!
//! The flow is linear: [`Ring::from_config`] resolves directives against
//! the cell catalog, [`Ring::solve`] turns the four sides into absolute
//! coordinates (consuming the ring, so solved geometry is frozen by
//! construction), and [`SolvedRing::placements`] materializes the
//! ordered stream of placed cells — corners first, then each side with
//! its gaps expanded into filler cells — that the GDS2/SVG/DEF writers
//! consume. Stream order is part of the output contract: GDS2 files
//! must come out byte-identical for identical inputs.

pub mod error;
pub mod filler;
pub mod orient;
pub mod ring;
pub mod side;

pub use error::LayoutError;
pub use orient::{Rotation, Transform};
pub use ring::{Corner, Ring, SolvedRing};
pub use side::{ItemKind, LayoutItem, Location, Placement, Side, SideId};
