//! GDS2 stream encoder.
//!
//! The output is a flat library with a single structure: one `SREF`
//! per placed cell, carrying the cell's transform. Byte layout is the
//! contract — identical inputs must produce identical files — so every
//! multi-byte value goes through [`Gds2Writer::record`] (big-endian,
//! even record lengths including the 4-byte record header) and the only
//! floating-point values ever emitted, the three rotation angles and
//! the unit scale, are hard-coded GDS2 8-byte reals rather than
//! converted at run time.
//!
//! Units are fixed: 1 µm user units, 1 nm database units; `XY` records
//! therefore carry integer nanometers.
//!
//! A writer dropped before [`RingWriter::finish`] still emits
//! `ENDSTR`/`ENDLIB` so a file cut short by a layout failure remains
//! syntactically closed.

use crate::RingWriter;
use anyhow::Result;
use core_layout::{Placement, Rotation};
use std::io::Write;
use tracing::{debug, trace};

// Record tags: u16 record type and data-format word.
const HEADER: u16 = 0x0002;
const BGNLIB: u16 = 0x0102;
const LIBNAME: u16 = 0x0206;
const UNITS: u16 = 0x0305;
const BGNSTR: u16 = 0x0502;
const STRNAME: u16 = 0x0606;
const ENDSTR: u16 = 0x0700;
const ENDLIB: u16 = 0x0400;
const SREF: u16 = 0x0A00;
const SNAME: u16 = 0x1206;
const STRANS: u16 = 0x1A01;
const ANGLE: u16 = 0x1C05;
const XY: u16 = 0x1003;
const ENDEL: u16 = 0x1100;

/// GDS2 stream version word.
const VERSION: [u8; 2] = [0x00, 0x03];

/// 1 µm per user unit, 1 nm per database unit, as two GDS2 8-byte
/// reals (excess-64 base-16 exponent, 56-bit fraction).
const UNIT_SCALE: [u8; 16] = [
    0x3E, 0x41, 0x89, 0x37, 0x4B, 0xC6, 0xA7, 0xEF, //
    0x39, 0x44, 0xB8, 0x2F, 0xA0, 0x9B, 0x5A, 0x54,
];

/// The three non-zero cardinal angles as GDS2 reals.
const ANGLE_90: [u8; 8] = [0x42, 0x5A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
const ANGLE_180: [u8; 8] = [0x42, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
const ANGLE_270: [u8; 8] = [0x43, 0x10, 0xE0, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Historical library name of the reference stream; overridable but
/// stable by default so regenerated rings diff clean.
pub const DEFAULT_LIB_NAME: &str = "AAAAAAAAAAAAAA";

/// Database units per micron (`XY` coordinates are nanometers).
const DB_PER_MICRON: f64 = 1000.0;

pub struct Gds2Writer<W: Write> {
    out: W,
    finished: bool,
}

impl<W: Write> Gds2Writer<W> {
    /// Open a stream and write the library prolog up to and including
    /// `STRNAME`.
    pub fn new(out: W, design_name: &str) -> std::io::Result<Self> {
        Self::with_lib_name(out, design_name, DEFAULT_LIB_NAME)
    }

    pub fn with_lib_name(out: W, design_name: &str, lib_name: &str) -> std::io::Result<Self> {
        let mut writer = Self {
            out,
            finished: false,
        };
        writer.write_prolog(design_name, lib_name)?;
        debug!(target: "write.gds2", design = design_name, "gds2_stream_opened");
        Ok(writer)
    }

    /// One record: u16 length (inclusive of this 4-byte header, always
    /// even), u16 tag, payload.
    fn record(&mut self, tag: u16, payload: &[u8]) -> std::io::Result<()> {
        debug_assert!(payload.len() % 2 == 0, "GDS2 payloads are even-sized");
        let length = (payload.len() + 4) as u16;
        self.out.write_all(&length.to_be_bytes())?;
        self.out.write_all(&tag.to_be_bytes())?;
        self.out.write_all(payload)
    }

    /// A string record, null-padded to even length. The length word
    /// counts the padded size.
    fn name_record(&mut self, tag: u16, name: &str) -> std::io::Result<()> {
        let mut payload = name.as_bytes().to_vec();
        if payload.len() % 2 == 1 {
            payload.push(0);
        }
        self.record(tag, &payload)
    }

    fn write_prolog(&mut self, design_name: &str, lib_name: &str) -> std::io::Result<()> {
        self.record(HEADER, &VERSION)?;
        // Modification/access timestamps zeroed: output depends on the
        // inputs alone.
        self.record(BGNLIB, &[0u8; 24])?;
        self.name_record(LIBNAME, lib_name)?;
        self.record(UNITS, &UNIT_SCALE)?;
        self.record(BGNSTR, &[0u8; 24])?;
        self.name_record(STRNAME, design_name)
    }

    fn write_epilog(&mut self) -> std::io::Result<()> {
        self.record(ENDSTR, &[])?;
        self.record(ENDLIB, &[])?;
        self.out.flush()
    }

    fn write_sref(&mut self, placement: &Placement) -> std::io::Result<()> {
        let transform = placement.transform();
        trace!(
            target: "write.gds2",
            cell = placement.cell_name.as_str(),
            x = transform.origin.0,
            y = transform.origin.1,
            rotation = transform.rotation.degrees(),
            flip = transform.flip_y,
            "sref"
        );

        self.record(SREF, &[])?;
        self.name_record(SNAME, &placement.cell_name)?;
        let strans: u16 = if transform.flip_y { 0x8000 } else { 0x0000 };
        self.record(STRANS, &strans.to_be_bytes())?;
        match transform.rotation {
            Rotation::R0 => {}
            Rotation::R90 => self.record(ANGLE, &ANGLE_90)?,
            Rotation::R180 => self.record(ANGLE, &ANGLE_180)?,
            Rotation::R270 => self.record(ANGLE, &ANGLE_270)?,
        }
        let x = (transform.origin.0 * DB_PER_MICRON).round() as i32;
        let y = (transform.origin.1 * DB_PER_MICRON).round() as i32;
        let mut xy = [0u8; 8];
        xy[..4].copy_from_slice(&x.to_be_bytes());
        xy[4..].copy_from_slice(&y.to_be_bytes());
        self.record(XY, &xy)?;
        self.record(ENDEL, &[])
    }
}

impl<W: Write> RingWriter for Gds2Writer<W> {
    fn write_cell(&mut self, placement: &Placement) -> Result<()> {
        self.write_sref(placement)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.write_epilog()?;
        self.finished = true;
        debug!(target: "write.gds2", "gds2_stream_closed");
        Ok(())
    }
}

impl<W: Write> Drop for Gds2Writer<W> {
    fn drop(&mut self) {
        // Keep aborted files syntactically closed; the run is already
        // failing, so a second error here is only worth a log line.
        if !self.finished && self.write_epilog().is_err() {
            debug!(target: "write.gds2", "epilog_write_failed_on_drop");
        }
    }
}
