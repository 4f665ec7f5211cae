//! Side models and placed items.
//!
//! A [`Side`] holds the interior of one die edge in user order; the four
//! corner records live on the ring itself since each corner is shared by
//! two sides. Items carry their length along the side and, once the
//! solver has run, an absolute origin in the die coordinate system
//! (origin at the south-west die corner, +x east, +y north, microns).

use core_cells::CellDescriptor;
use std::fmt;

/// The four die edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideId {
    North,
    South,
    East,
    West,
}

impl SideId {
    pub fn as_str(self) -> &'static str {
        match self {
            SideId::North => "north",
            SideId::South => "south",
            SideId::East => "east",
            SideId::West => "west",
        }
    }

    /// Lowercase letter used in generated instance names.
    pub fn letter(self) -> char {
        match self {
            SideId::North => 'n',
            SideId::South => 's',
            SideId::East => 'e',
            SideId::West => 'w',
        }
    }

    pub fn location(self) -> Location {
        match self {
            SideId::North => Location::North,
            SideId::South => Location::South,
            SideId::East => Location::East,
            SideId::West => Location::West,
        }
    }
}

impl fmt::Display for SideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a placed item sits: one of the four edges for regular cells,
/// one of the four geometric corners for corner cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    North,
    South,
    East,
    West,
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Location {
    pub fn as_str(self) -> &'static str {
        match self {
            Location::North => "N",
            Location::South => "S",
            Location::East => "E",
            Location::West => "W",
            Location::NorthWest => "NW",
            Location::NorthEast => "NE",
            Location::SouthWest => "SW",
            Location::SouthEast => "SE",
        }
    }

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            Location::NorthWest | Location::NorthEast | Location::SouthWest | Location::SouthEast
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Corner,
    Cell,
    FixedSpace,
    FlexSpace,
    Filler,
}

/// One entry of a side: a pad cell or a space awaiting fillers.
///
/// `size` is the length along the side. Pads on the east and west edges
/// are rotated onto the die, so their length along the side is still
/// the cell's LEF width.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutItem {
    pub kind: ItemKind,
    /// Empty for spaces.
    pub cell_name: String,
    /// Empty for spaces.
    pub instance: String,
    pub size: f64,
    pub x: f64,
    pub y: f64,
    pub location: Location,
    pub flipped: bool,
    /// Resolved from the catalog for cells; `None` for spaces.
    pub descriptor: Option<CellDescriptor>,
}

impl LayoutItem {
    pub fn cell(
        location: Location,
        cell_name: &str,
        instance: &str,
        flipped: bool,
        descriptor: &CellDescriptor,
    ) -> Self {
        Self {
            kind: ItemKind::Cell,
            cell_name: cell_name.to_string(),
            instance: instance.to_string(),
            size: descriptor.size_x,
            x: 0.0,
            y: 0.0,
            location,
            flipped,
            descriptor: Some(descriptor.clone()),
        }
    }

    pub fn space(kind: ItemKind, location: Location, size: f64) -> Self {
        Self {
            kind,
            cell_name: String::new(),
            instance: String::new(),
            size,
            x: 0.0,
            y: 0.0,
            location,
            flipped: false,
            descriptor: None,
        }
    }

    pub fn is_space(&self) -> bool {
        matches!(self.kind, ItemKind::FixedSpace | ItemKind::FlexSpace)
    }
}

/// Interior of one die edge, in user order. Corners are not items here;
/// they belong to the ring.
#[derive(Debug, Clone)]
pub struct Side {
    pub id: SideId,
    pub(crate) items: Vec<LayoutItem>,
}

impl Side {
    pub(crate) fn new(id: SideId) -> Self {
        Self {
            id,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[LayoutItem] {
        &self.items
    }
}

/// A fully placed cell, ready for the writers: corners, pads, and
/// fillers only — spaces have been expanded away. Cell extents are
/// carried inline (not borrowed from the catalog) so the stream owns
/// everything the encoders need.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub kind: ItemKind,
    pub cell_name: String,
    pub instance: String,
    /// Origin before the orientation correction, microns.
    pub x: f64,
    pub y: f64,
    pub location: Location,
    pub flipped: bool,
    /// LEF cell width, microns.
    pub size_x: f64,
    /// LEF cell height, microns.
    pub size_y: f64,
}

impl Placement {
    pub(crate) fn from_item(item: &LayoutItem, descriptor: &CellDescriptor) -> Self {
        Self {
            kind: item.kind,
            cell_name: item.cell_name.clone(),
            instance: item.instance.clone(),
            x: item.x,
            y: item.y,
            location: item.location,
            flipped: item.flipped,
            size_x: descriptor.size_x,
            size_y: descriptor.size_y,
        }
    }
}
