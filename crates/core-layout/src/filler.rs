//! Greedy filler packing.
//!
//! Every space item that survives the solver with nonzero length is
//! tiled with filler cells, widest-first, until less than half a
//! nanometer remains — below that the gap cannot be expressed in the
//! writers' integer-nanometer coordinates and counts as closed. A gap
//! no catalog filler fits is fatal: the ring would not be gap-free.

use crate::error::LayoutError;
use crate::side::{ItemKind, LayoutItem, Location, Placement};
use core_cells::{CellCatalog, FillerCatalog, WIDTH_SLACK};
use tracing::{debug, trace};

/// Expand one solved space item into filler placements. `ordinal` is
/// the running filler count of the side, used for instance names.
pub fn pack_gap(
    gap: &LayoutItem,
    fillers: &FillerCatalog,
    catalog: &CellCatalog,
    ordinal: &mut usize,
) -> Result<Vec<Placement>, LayoutError> {
    debug_assert!(gap.is_space(), "only space items are packed");
    let letter = match gap.location {
        Location::North => 'n',
        Location::South => 's',
        Location::East => 'e',
        Location::West => 'w',
        // Corners never carry gaps.
        _ => 'x',
    };

    let mut out = Vec::new();
    let mut remaining = gap.size;
    let (mut x, mut y) = (gap.x, gap.y);

    while remaining > WIDTH_SLACK {
        let Some((name, width)) = fillers.largest_fit(remaining) else {
            return Err(LayoutError::Unfillable { gap: remaining });
        };
        let descriptor = catalog
            .lookup(name)
            .ok_or_else(|| LayoutError::UnknownCell(name.to_string()))?;
        trace!(
            target: "layout.filler",
            cell = name,
            width,
            x,
            y,
            remaining,
            "filler_placed"
        );
        out.push(Placement {
            kind: ItemKind::Filler,
            cell_name: name.to_string(),
            instance: format!("fill_{letter}{ordinal}"),
            x,
            y,
            location: gap.location,
            flipped: false,
            size_x: descriptor.size_x,
            size_y: descriptor.size_y,
        });
        *ordinal += 1;
        match gap.location {
            Location::East | Location::West => y += width,
            _ => x += width,
        }
        remaining -= width;
    }

    debug!(
        target: "layout.filler",
        location = %gap.location,
        gap = gap.size,
        cells = out.len(),
        "gap_packed"
    );
    Ok(out)
}
