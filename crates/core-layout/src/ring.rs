//! The pad ring: four sides, four shared corners, and the solver that
//! turns directives into absolute coordinates.
//!
//! Corner ownership follows the north/south sides: their first and last
//! corner directives define which cell sits at each geometric corner,
//! and the east/west sides' bracketing corner directives must agree
//! with them. Each corner is stored once and emitted once.
//!
//! Solving is a single pass per side:
//! 1. usable length = die edge minus both corner footprints;
//! 2. fixed total = cells + fixed spaces;
//! 3. flex spaces share the remainder equally, floored to the grid,
//!    with the rounding residue going to the last flex in user order;
//! 4. a side with no flex and leftover length gets an implicit trailing
//!    gap so filler packing still closes it;
//! 5. a cursor walk from start corner to end corner assigns origins.

use crate::error::LayoutError;
use crate::filler::pack_gap;
use crate::side::{ItemKind, LayoutItem, Location, Placement, Side, SideId};
use core_cells::{CellCatalog, CellDescriptor, FillerCatalog, WIDTH_SLACK};
use core_config::{Directive, RingConfig};
use tracing::{debug, info};

/// One geometric die corner, shared by its two adjoining sides.
#[derive(Debug, Clone, PartialEq)]
pub struct Corner {
    pub location: Location,
    pub cell_name: String,
    pub instance: String,
    pub descriptor: CellDescriptor,
    pub x: f64,
    pub y: f64,
}

impl Corner {
    fn placement(&self) -> Placement {
        Placement {
            kind: ItemKind::Corner,
            cell_name: self.cell_name.clone(),
            instance: self.instance.clone(),
            x: self.x,
            y: self.y,
            location: self.location,
            flipped: false,
            size_x: self.descriptor.size_x,
            size_y: self.descriptor.size_y,
        }
    }
}

/// An unsolved ring: directives resolved against the catalog, geometry
/// not yet assigned.
#[derive(Debug, Clone)]
pub struct Ring {
    design_name: String,
    die_width: f64,
    die_height: f64,
    grid: f64,
    /// NW, NE, SW, SE — also the emission order of the corners.
    corners: [Corner; 4],
    north: Side,
    south: Side,
    east: Side,
    west: Side,
}

/// A solved ring: every item has an absolute origin and the side models
/// are frozen.
#[derive(Debug, Clone)]
pub struct SolvedRing {
    pub design_name: String,
    pub die_width: f64,
    pub die_height: f64,
    pub grid: f64,
    corners: [Corner; 4],
    north: Side,
    south: Side,
    east: Side,
    west: Side,
}

impl Ring {
    /// Resolve a validated configuration against the cell catalog.
    pub fn from_config(config: &RingConfig, catalog: &CellCatalog) -> Result<Self, LayoutError> {
        let corner_cell = |directives: &[Directive], first: bool| -> String {
            let directive = if first {
                directives.first()
            } else {
                directives.last()
            };
            match directive {
                Some(Directive::Corner { cell }) => cell.clone(),
                // Config validation guarantees the brackets exist.
                _ => String::new(),
            }
        };

        // North and south own the corner definitions.
        let nw = corner_cell(&config.north, true);
        let ne = corner_cell(&config.north, false);
        let sw = corner_cell(&config.south, true);
        let se = corner_cell(&config.south, false);

        // East and west must agree with them.
        let checks = [
            (SideId::West, Location::SouthWest, &sw, corner_cell(&config.west, true)),
            (SideId::West, Location::NorthWest, &nw, corner_cell(&config.west, false)),
            (SideId::East, Location::SouthEast, &se, corner_cell(&config.east, true)),
            (SideId::East, Location::NorthEast, &ne, corner_cell(&config.east, false)),
        ];
        for (side, corner, expected, found) in checks {
            if *expected != found {
                return Err(LayoutError::CornerMismatch {
                    corner,
                    side,
                    expected: expected.clone(),
                    found,
                });
            }
        }

        let resolve = |name: &str| -> Result<CellDescriptor, LayoutError> {
            catalog
                .lookup(name)
                .cloned()
                .ok_or_else(|| LayoutError::UnknownCell(name.to_string()))
        };
        let corner = |location: Location, cell: String| -> Result<Corner, LayoutError> {
            let descriptor = resolve(&cell)?;
            Ok(Corner {
                location,
                instance: format!("corner_{}", location.as_str().to_lowercase()),
                cell_name: cell,
                descriptor,
                x: 0.0,
                y: 0.0,
            })
        };

        let corners = [
            corner(Location::NorthWest, nw)?,
            corner(Location::NorthEast, ne)?,
            corner(Location::SouthWest, sw)?,
            corner(Location::SouthEast, se)?,
        ];

        let build_side = |id: SideId, directives: &[Directive]| -> Result<Side, LayoutError> {
            let mut side = Side::new(id);
            let location = id.location();
            // Skip the bracketing corners; they live on the ring.
            for directive in &directives[1..directives.len() - 1] {
                let item = match directive {
                    Directive::Corner { .. } => {
                        return Err(LayoutError::UnexpectedCorner { side: id });
                    }
                    Directive::Pad {
                        cell,
                        instance,
                        flip,
                    } => LayoutItem::cell(location, cell, instance, *flip, &resolve(cell)?),
                    Directive::Space { width } => {
                        LayoutItem::space(ItemKind::FixedSpace, location, *width)
                    }
                    Directive::Flex => LayoutItem::space(ItemKind::FlexSpace, location, 0.0),
                };
                side.items.push(item);
            }
            Ok(side)
        };

        Ok(Self {
            design_name: config.design_name.clone(),
            die_width: config.die_width,
            die_height: config.die_height,
            grid: config.grid,
            north: build_side(SideId::North, &config.north)?,
            south: build_side(SideId::South, &config.south)?,
            east: build_side(SideId::East, &config.east)?,
            west: build_side(SideId::West, &config.west)?,
            corners,
        })
    }

    /// Resolve flex widths and assign absolute origins, consuming the
    /// ring so the solved geometry cannot be re-solved or mutated.
    pub fn solve(mut self) -> Result<SolvedRing, LayoutError> {
        let (w, h) = (self.die_width, self.die_height);
        let [nw, ne, sw, se] = &mut self.corners;

        // Corners are square; they cover their full extent on both
        // adjoining sides. Origins follow the orientation table.
        nw.x = 0.0;
        nw.y = h;
        ne.x = w - ne.descriptor.size_x;
        ne.y = h;
        sw.x = 0.0;
        sw.y = 0.0;
        se.x = w - se.descriptor.size_y;
        se.y = 0.0;

        let frames = [
            // (side, start corner size, end corner size, edge length, start x, start y)
            (
                SideId::North,
                nw.descriptor.size_x,
                ne.descriptor.size_x,
                w,
                nw.descriptor.size_x,
                h,
            ),
            (
                SideId::South,
                sw.descriptor.size_x,
                se.descriptor.size_x,
                w,
                sw.descriptor.size_x,
                0.0,
            ),
            (
                SideId::West,
                sw.descriptor.size_y,
                nw.descriptor.size_y,
                h,
                0.0,
                sw.descriptor.size_y,
            ),
            (
                SideId::East,
                se.descriptor.size_y,
                ne.descriptor.size_y,
                h,
                w,
                se.descriptor.size_y,
            ),
        ];

        for (id, start_corner, end_corner, edge, x, y) in frames {
            let usable = edge - start_corner - end_corner;
            let side = match id {
                SideId::North => &mut self.north,
                SideId::South => &mut self.south,
                SideId::East => &mut self.east,
                SideId::West => &mut self.west,
            };
            solve_side(side, usable, x, y, self.grid)?;
        }

        info!(
            target: "layout",
            design = self.design_name.as_str(),
            die_width = w,
            die_height = h,
            "ring_solved"
        );

        Ok(SolvedRing {
            design_name: self.design_name,
            die_width: self.die_width,
            die_height: self.die_height,
            grid: self.grid,
            corners: self.corners,
            north: self.north,
            south: self.south,
            east: self.east,
            west: self.west,
        })
    }
}

fn solve_side(
    side: &mut Side,
    usable: f64,
    start_x: f64,
    start_y: f64,
    grid: f64,
) -> Result<(), LayoutError> {
    let fixed_total: f64 = side
        .items
        .iter()
        .filter(|item| item.kind != ItemKind::FlexSpace)
        .map(|item| item.size)
        .sum();
    let flex_count = side
        .items
        .iter()
        .filter(|item| item.kind == ItemKind::FlexSpace)
        .count();

    let leftover = usable - fixed_total;
    if leftover < -WIDTH_SLACK {
        return Err(LayoutError::Overfull {
            side: side.id,
            needed: fixed_total,
            usable,
        });
    }
    let leftover = leftover.max(0.0);

    if flex_count == 0 {
        if leftover > WIDTH_SLACK {
            // No flex to absorb the slack: close it with a trailing gap
            // that filler packing will tile.
            side.items.push(LayoutItem::space(
                ItemKind::FixedSpace,
                side.id.location(),
                leftover,
            ));
        }
    } else {
        // Equal shares floored to the grid; the rounding residue lands
        // on the last flex so the side still sums exactly.
        let share = leftover / flex_count as f64;
        let quantized = (share / grid).floor() * grid;
        let mut assigned = 0.0;
        let mut remaining = flex_count;
        for item in side
            .items
            .iter_mut()
            .filter(|item| item.kind == ItemKind::FlexSpace)
        {
            remaining -= 1;
            item.size = if remaining == 0 {
                leftover - assigned
            } else {
                quantized
            };
            assigned += quantized;
        }
    }

    let (mut x, mut y) = (start_x, start_y);
    for item in &mut side.items {
        item.x = x;
        item.y = y;
        match side.id {
            SideId::North | SideId::South => x += item.size,
            SideId::East | SideId::West => y += item.size,
        }
    }

    debug!(
        target: "layout",
        side = %side.id,
        usable,
        fixed_total,
        flex_count,
        leftover,
        items = side.items.len(),
        "side_solved"
    );
    Ok(())
}

impl SolvedRing {
    /// NW, NE, SW, SE.
    pub fn corners(&self) -> &[Corner; 4] {
        &self.corners
    }

    pub fn side(&self, id: SideId) -> &Side {
        match id {
            SideId::North => &self.north,
            SideId::South => &self.south,
            SideId::East => &self.east,
            SideId::West => &self.west,
        }
    }

    /// Materialize the placement stream the writers consume: the four
    /// corners (NW, NE, SW, SE), then each side's interior in user
    /// order — north, south, west, east — with every space expanded
    /// into filler cells. This order is observable in the GDS2 output
    /// and must stay stable.
    pub fn placements(
        &self,
        catalog: &CellCatalog,
        fillers: &FillerCatalog,
    ) -> Result<Vec<Placement>, LayoutError> {
        let mut out: Vec<Placement> = self.corners.iter().map(Corner::placement).collect();

        for id in [SideId::North, SideId::South, SideId::West, SideId::East] {
            let side = self.side(id);
            let mut filler_ordinal = 0usize;
            for item in side.items() {
                match item.kind {
                    ItemKind::Cell => {
                        let Some(descriptor) = item.descriptor.as_ref() else {
                            return Err(LayoutError::UnknownCell(item.cell_name.clone()));
                        };
                        out.push(Placement::from_item(item, descriptor));
                    }
                    ItemKind::FixedSpace | ItemKind::FlexSpace => {
                        out.extend(pack_gap(item, fillers, catalog, &mut filler_ordinal)?);
                    }
                    // Corners live on the ring, fillers are generated.
                    ItemKind::Corner | ItemKind::Filler => {}
                }
            }
        }

        debug!(target: "layout", placements = out.len(), "placements_materialized");
        Ok(out)
    }
}
