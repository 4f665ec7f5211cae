//! Orientation algebra.
//!
//! Every placed cell is described in its LEF frame: origin at the cell's
//! south-west corner, width `size_x`, height `size_y`. To lie flush
//! against its die edge the cell gets a GDS2 transform — an optional
//! mirror across the x axis applied *before* a cardinal rotation — plus
//! an origin correction, because GDS2 anchors the reference at the
//! cell origin prior to the transform.
//!
//! The mapping from (location, flip request) to (rotation, mirror,
//! origin offset) is a fixed twelve-row table; [`Placement::transform`]
//! encodes it and [`Placement::bounds`] replays the resulting transform
//! over the cell box, which is what the writers that need an axis-
//! aligned rectangle (SVG, DEF) and the flush-placement tests use.

use crate::side::{Location, Placement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    /// Apply the rotation to a point in the cell frame.
    fn apply(self, u: f64, v: f64) -> (f64, f64) {
        match self {
            Rotation::R0 => (u, v),
            Rotation::R90 => (-v, u),
            Rotation::R180 => (-u, -v),
            Rotation::R270 => (v, -u),
        }
    }
}

/// The placement transform of one cell, in GDS2 terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation: Rotation,
    /// Mirror across the x axis, applied before `rotation`.
    pub flip_y: bool,
    /// Reference anchor after the origin correction, microns.
    pub origin: (f64, f64),
}

impl Placement {
    pub fn transform(&self) -> Transform {
        use Location::*;
        use Rotation::*;
        let (rotation, flip_y, dx, dy) = match (self.location, self.flipped) {
            (North, false) => (R180, false, self.size_x, 0.0),
            (North, true) => (R0, true, 0.0, 0.0),
            (South, false) => (R0, false, 0.0, 0.0),
            (South, true) => (R180, true, self.size_x, 0.0),
            (East, false) => (R90, false, 0.0, 0.0),
            (East, true) => (R270, true, 0.0, self.size_x),
            (West, false) => (R270, false, 0.0, self.size_x),
            (West, true) => (R90, true, 0.0, 0.0),
            // Corner cells ignore the flip request.
            (NorthWest, _) => (R270, false, 0.0, 0.0),
            (NorthEast, _) => (R180, false, self.size_x, 0.0),
            (SouthEast, _) => (R90, false, self.size_y, 0.0),
            (SouthWest, _) => (R0, false, 0.0, 0.0),
        };
        Transform {
            rotation,
            flip_y,
            origin: (self.x + dx, self.y + dy),
        }
    }

    /// Axis-aligned box `(x0, y0, x1, y1)` the cell covers on the die
    /// after its transform, microns.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let t = self.transform();
        let mut x0 = f64::INFINITY;
        let mut y0 = f64::INFINITY;
        let mut x1 = f64::NEG_INFINITY;
        let mut y1 = f64::NEG_INFINITY;
        for (u, v) in [
            (0.0, 0.0),
            (self.size_x, 0.0),
            (0.0, self.size_y),
            (self.size_x, self.size_y),
        ] {
            let v = if t.flip_y { -v } else { v };
            let (rx, ry) = t.rotation.apply(u, v);
            let px = t.origin.0 + rx;
            let py = t.origin.1 + ry;
            x0 = x0.min(px);
            y0 = y0.min(py);
            x1 = x1.max(px);
            y1 = y1.max(py);
        }
        (x0, y0, x1, y1)
    }
}
