//! DEF export for place-and-route handoff.
//!
//! DEF wants the component count before the components, so placements
//! are buffered and the file is written in one piece at `finish`.
//! Coordinates are DEF database units (`UNITS DISTANCE MICRONS` comes
//! from the LEF database units); the placement point is the lower-left
//! corner of the cell's transformed box, and the orientation letter is
//! derived from the same (rotation, mirror) pair the GDS2 stream uses.

use crate::RingWriter;
use anyhow::Result;
use core_layout::{Placement, Rotation, Transform};
use std::io::Write;
use tracing::debug;

pub struct DefWriter<W: Write> {
    out: W,
    design_name: String,
    die_width: f64,
    die_height: f64,
    database_units: f64,
    components: Vec<Placement>,
}

impl<W: Write> DefWriter<W> {
    pub fn new(
        out: W,
        design_name: &str,
        die_width: f64,
        die_height: f64,
        database_units: f64,
    ) -> Self {
        Self {
            out,
            design_name: design_name.to_string(),
            die_width,
            die_height,
            database_units,
            components: Vec::new(),
        }
    }

    fn scaled(&self, microns: f64) -> i64 {
        (microns * self.database_units).round() as i64
    }
}

/// DEF orientation letter for a placement transform.
fn orientation(transform: &Transform) -> &'static str {
    match (transform.rotation, transform.flip_y) {
        (Rotation::R0, false) => "N",
        (Rotation::R90, false) => "W",
        (Rotation::R180, false) => "S",
        (Rotation::R270, false) => "E",
        (Rotation::R0, true) => "FN",
        (Rotation::R90, true) => "FW",
        (Rotation::R180, true) => "FS",
        (Rotation::R270, true) => "FE",
    }
}

impl<W: Write> RingWriter for DefWriter<W> {
    fn write_cell(&mut self, placement: &Placement) -> Result<()> {
        self.components.push(placement.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.out, "VERSION 5.8 ;")?;
        writeln!(self.out, "DIVIDERCHAR \"/\" ;")?;
        writeln!(self.out, "BUSBITCHARS \"[]\" ;")?;
        writeln!(self.out, "DESIGN {} ;", self.design_name)?;
        writeln!(
            self.out,
            "UNITS DISTANCE MICRONS {} ;",
            self.database_units
        )?;
        writeln!(
            self.out,
            "DIEAREA ( 0 0 ) ( {} {} ) ;",
            self.scaled(self.die_width),
            self.scaled(self.die_height)
        )?;
        writeln!(self.out)?;
        writeln!(self.out, "COMPONENTS {} ;", self.components.len())?;
        for placement in &self.components {
            let (x0, y0, _, _) = placement.bounds();
            writeln!(
                self.out,
                "- {} {} + FIXED ( {} {} ) {} ;",
                placement.instance,
                placement.cell_name,
                self.scaled(x0),
                self.scaled(y0),
                orientation(&placement.transform())
            )?;
        }
        writeln!(self.out, "END COMPONENTS")?;
        writeln!(self.out)?;
        writeln!(self.out, "END DESIGN")?;
        self.out.flush()?;
        debug!(
            target: "write.def",
            design = self.design_name.as_str(),
            components = self.components.len(),
            "def_closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_layout::{ItemKind, Location};

    fn placement(location: Location, flipped: bool, x: f64, y: f64) -> Placement {
        Placement {
            kind: ItemKind::Cell,
            cell_name: "GPIO".into(),
            instance: "gpio_0".into(),
            x,
            y,
            location,
            flipped,
            size_x: 20.0,
            size_y: 30.0,
        }
    }

    fn written(placements: &[Placement]) -> String {
        let mut bytes = Vec::new();
        let mut writer = DefWriter::new(&mut bytes, "ringtest", 100.0, 100.0, 1000.0);
        for p in placements {
            writer.write_cell(p).unwrap();
        }
        writer.finish().unwrap();
        drop(writer);
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn header_carries_design_units_and_die() {
        let text = written(&[]);
        assert!(text.contains("DESIGN ringtest ;"));
        assert!(text.contains("UNITS DISTANCE MICRONS 1000 ;"));
        assert!(text.contains("DIEAREA ( 0 0 ) ( 100000 100000 ) ;"));
        assert!(text.contains("COMPONENTS 0 ;"));
        assert!(text.trim_end().ends_with("END DESIGN"));
    }

    #[test]
    fn components_are_fixed_at_their_box_corner() {
        // North unflipped: box [40,60]x[70,100], S orientation.
        let text = written(&[placement(Location::North, false, 40.0, 100.0)]);
        assert!(text.contains("COMPONENTS 1 ;"));
        assert!(text.contains("- gpio_0 GPIO + FIXED ( 40000 70000 ) S ;"));
    }

    #[test]
    fn flipped_cells_get_mirrored_orientations() {
        let text = written(&[placement(Location::North, true, 40.0, 100.0)]);
        assert!(text.contains("- gpio_0 GPIO + FIXED ( 40000 70000 ) FN ;"));

        let text = written(&[placement(Location::West, true, 0.0, 40.0)]);
        assert!(text.contains(") FW ;"));
    }
}
