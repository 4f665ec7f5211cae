//! Layout failures. All of them abort the run; the binary maps each to
//! one diagnostic line and a nonzero exit.

use crate::side::{Location, SideId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("cell {0} is not in the LEF catalog")]
    UnknownCell(String),
    #[error(
        "side {side} is overfull: fixed items need {needed:.3} um \
         but only {usable:.3} um is available between the corners"
    )]
    Overfull {
        side: SideId,
        needed: f64,
        usable: f64,
    },
    #[error("no filler cell fits the remaining {gap:.3} um; the ring cannot be closed")]
    Unfillable { gap: f64 },
    #[error(
        "{corner} corner mismatch: side {side} names {found}, \
         but the adjoining side already placed {expected}"
    )]
    CornerMismatch {
        corner: Location,
        side: SideId,
        expected: String,
        found: String,
    },
    #[error("side {side} has a corner directive between its end corners")]
    UnexpectedCorner { side: SideId },
}
