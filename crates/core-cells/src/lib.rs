//! Cell catalog shared by the layout solver and the output writers.
//!
//! Two read-only views over the LEF-derived cell library:
//! * [`CellCatalog`] — name → descriptor index, populated once while the
//!   LEF files are parsed and immutable afterwards.
//! * [`FillerCatalog`] — the filler subset, sorted widest-first so gap
//!   packing can take the largest cell that still fits.
//!
//! Invariants:
//! * Catalog keys are unique and case-sensitive; a re-inserted name
//!   replaces the previous descriptor (logged, last write wins).
//! * Filler widths are strictly positive and sorted descending.

use thiserror::Error;
use tracing::{debug, warn};

/// Half a nanometer expressed in microns. The output encoders quantize
/// coordinates to integer nanometers, so any residual length below this
/// slack is indistinguishable from zero in every artifact we emit.
pub const WIDTH_SLACK: f64 = 0.0005;

/// One cell from the LEF library: bounding box size and filler flag.
#[derive(Debug, Clone, PartialEq)]
pub struct CellDescriptor {
    pub name: String,
    /// Width in microns.
    pub size_x: f64,
    /// Height in microns.
    pub size_y: f64,
    /// True for spacer cells that may be used to close ring gaps.
    pub is_filler: bool,
}

impl CellDescriptor {
    pub fn new(name: impl Into<String>, size_x: f64, size_y: f64, is_filler: bool) -> Self {
        Self {
            name: name.into(),
            size_x,
            size_y,
            is_filler,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no filler cells found; mark spacer cells in the LEF or pass a filler prefix")]
    NoFillers,
}

/// Name → descriptor index over every cell read from the LEF files.
///
/// Backed by a sorted map so reporting and iteration order are
/// deterministic across runs.
#[derive(Debug, Default)]
pub struct CellCatalog {
    cells: std::collections::BTreeMap<String, CellDescriptor>,
}

impl CellCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor under its own name. A duplicate name replaces
    /// the earlier descriptor; LEF files read later shadow earlier ones.
    pub fn insert(&mut self, cell: CellDescriptor) {
        debug!(
            target: "cells",
            name = cell.name.as_str(),
            size_x = cell.size_x,
            size_y = cell.size_y,
            is_filler = cell.is_filler,
            "cell_registered"
        );
        if let Some(prev) = self.cells.insert(cell.name.clone(), cell) {
            warn!(target: "cells", name = prev.name.as_str(), "cell_redefined");
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&CellDescriptor> {
        self.cells.get(name)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Descriptors in name order.
    pub fn iter(&self) -> impl Iterator<Item = &CellDescriptor> {
        self.cells.values()
    }
}

/// The filler subset of a [`CellCatalog`], widest cell first.
#[derive(Debug, Clone)]
pub struct FillerCatalog {
    /// (name, width) pairs sorted descending by width.
    cells: Vec<(String, f64)>,
}

impl FillerCatalog {
    /// Select fillers from `catalog`: every cell whose name starts with
    /// `prefix` when one is given, otherwise every cell flagged as a
    /// filler by the LEF. Cells without a positive width are skipped.
    pub fn from_catalog(
        catalog: &CellCatalog,
        prefix: Option<&str>,
    ) -> Result<Self, CatalogError> {
        let mut cells: Vec<(String, f64)> = catalog
            .iter()
            .filter(|cell| match prefix {
                Some(p) => cell.name.starts_with(p),
                None => cell.is_filler,
            })
            .filter(|cell| cell.size_x > 0.0)
            .map(|cell| (cell.name.clone(), cell.size_x))
            .collect();
        if cells.is_empty() {
            return Err(CatalogError::NoFillers);
        }
        // Descending by width; ties broken by name so ordering stays
        // deterministic across runs.
        cells.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        debug!(target: "cells", count = cells.len(), "filler_catalog_built");
        Ok(Self { cells })
    }

    /// Widest filler that still fits in `remaining` microns, within the
    /// half-nanometer slack the encoders can resolve.
    pub fn largest_fit(&self, remaining: f64) -> Option<(&str, f64)> {
        self.cells
            .iter()
            .find(|(_, width)| *width <= remaining + WIDTH_SLACK)
            .map(|(name, width)| (name.as_str(), *width))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Width of the narrowest filler, for the startup report.
    pub fn smallest_width(&self) -> f64 {
        self.cells.last().map(|(_, w)| *w).unwrap_or(0.0)
    }
}
