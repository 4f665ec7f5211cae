//! SVG rendering of the placed ring, for visual review.
//!
//! One rectangle per placed cell over a die outline, colored by item
//! kind, with the instance name lettered inside. Coordinates are
//! microns; the die's y axis points north, SVG's points down, so every
//! rectangle is emitted with `y = die_height - top`.

use crate::RingWriter;
use anyhow::Result;
use core_layout::{ItemKind, Placement};
use std::io::Write;
use tracing::debug;

const CORNER_FILL: &str = "#c8d2ec";
const CELL_FILL: &str = "#ecd2c8";
const FILLER_FILL: &str = "#e6e6e6";

pub struct SvgWriter<W: Write> {
    out: W,
    die_height: f64,
    cells: usize,
    finished: bool,
}

impl<W: Write> SvgWriter<W> {
    pub fn new(mut out: W, die_width: f64, die_height: f64) -> std::io::Result<Self> {
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
            -die_width * 0.05,
            -die_height * 0.05,
            die_width * 1.1,
            die_height * 1.1
        )?;
        writeln!(
            out,
            r##"  <rect x="0" y="0" width="{die_width}" height="{die_height}" fill="none" stroke="#202020" stroke-width="{}"/>"##,
            die_width * 0.002
        )?;
        Ok(Self {
            out,
            die_height,
            cells: 0,
            finished: false,
        })
    }
}

impl<W: Write> Drop for SvgWriter<W> {
    fn drop(&mut self) {
        // A run aborted mid-ring still leaves a viewable document.
        if !self.finished {
            let _ = writeln!(self.out, "</svg>");
            let _ = self.out.flush();
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;")
}

impl<W: Write> RingWriter for SvgWriter<W> {
    fn write_cell(&mut self, placement: &Placement) -> Result<()> {
        let (x0, y0, x1, y1) = placement.bounds();
        let (width, height) = (x1 - x0, y1 - y0);
        let fill = match placement.kind {
            ItemKind::Corner => CORNER_FILL,
            ItemKind::Filler => FILLER_FILL,
            _ => CELL_FILL,
        };
        writeln!(
            self.out,
            r##"  <rect x="{x0}" y="{}" width="{width}" height="{height}" fill="{fill}" stroke="#606060" stroke-width="{}"/>"##,
            self.die_height - y1,
            width.min(height) * 0.01
        )?;
        let font = width.min(height) * 0.22;
        writeln!(
            self.out,
            r#"  <text x="{}" y="{}" font-size="{font}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
            (x0 + x1) / 2.0,
            self.die_height - (y0 + y1) / 2.0,
            escape(&placement.instance)
        )?;
        self.cells += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.out, "</svg>")?;
        self.out.flush()?;
        self.finished = true;
        debug!(target: "write.svg", cells = self.cells, "svg_closed");
        Ok(())
    }
}
