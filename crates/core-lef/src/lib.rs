//! LEF reader feeding the cell catalog.
//!
//! This is not a general LEF database: the padring flow only needs each
//! macro's bounding box, its spacer flag, and the library's database
//! units (which the DEF writer echoes). Everything else — pins,
//! obstructions, layer geometry, properties — is recognized far enough
//! to be skipped.
//!
//! Parsing strategy: a flat token scanner (identifiers/numbers are
//! whitespace-delimited, `;` is its own token, `#` comments run to end
//! of line) driven by a small recursive-descent walk over the few block
//! constructs LEF has (`UNITS`, `MACRO`, `PIN`, `OBS`, ...). Unknown
//! statements are consumed up to their terminating `;`; unknown blocks
//! up to their matching `END`.

use anyhow::{Context, Result, anyhow, bail};
use core_cells::{CellCatalog, CellDescriptor};
use std::path::Path;
use tracing::{debug, info};

/// What one LEF file contributed.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LefSummary {
    pub cells_read: usize,
    /// `UNITS DATABASE MICRONS` value, when the file carried one.
    pub database_units: Option<f64>,
}

/// Parse a LEF file from disk into `catalog`.
pub fn parse_file(path: &Path, catalog: &mut CellCatalog) -> Result<LefSummary> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read LEF file {}", path.display()))?;
    let summary = parse_str(&text, catalog)
        .with_context(|| format!("cannot parse LEF file {}", path.display()))?;
    info!(
        target: "lef",
        file = %path.display(),
        cells = summary.cells_read,
        database_units = summary.database_units,
        "lef_read"
    );
    Ok(summary)
}

/// Parse LEF text into `catalog`.
pub fn parse_str(text: &str, catalog: &mut CellCatalog) -> Result<LefSummary> {
    let mut lex = Lexer::new(text);
    let mut summary = LefSummary::default();

    while let Some(tok) = lex.next() {
        match tok.as_str() {
            "UNITS" => {
                if let Some(units) = parse_units(&mut lex)? {
                    summary.database_units = Some(units);
                }
            }
            "MACRO" => {
                let cell = parse_macro(&mut lex)?;
                debug!(
                    target: "lef",
                    name = cell.name.as_str(),
                    size_x = cell.size_x,
                    size_y = cell.size_y,
                    is_filler = cell.is_filler,
                    "macro_parsed"
                );
                catalog.insert(cell);
                summary.cells_read += 1;
            }
            // `END LIBRARY` closes the file; a bare `END <name>` at top
            // level would be a stray block end and is skipped the same.
            "END" => {
                lex.next();
            }
            "PROPERTYDEFINITIONS" => skip_block(&mut lex, "PROPERTYDEFINITIONS")?,
            "SPACING" => skip_block(&mut lex, "SPACING")?,
            "LAYER" | "VIA" | "VIARULE" | "SITE" | "NONDEFAULTRULE" => {
                let name = lex
                    .next()
                    .ok_or_else(|| anyhow!("unexpected end of file after {tok}"))?;
                skip_block(&mut lex, &name)?;
            }
            _ => lex.skip_statement(),
        }
    }

    Ok(summary)
}

/// `UNITS ... END UNITS`, returning the `DATABASE MICRONS` value if any.
fn parse_units(lex: &mut Lexer<'_>) -> Result<Option<f64>> {
    let mut units = None;
    while let Some(tok) = lex.next() {
        match tok.as_str() {
            "DATABASE" => {
                lex.expect("MICRONS")?;
                let value: f64 = lex.number().context("bad DATABASE MICRONS value")?;
                if value <= 0.0 {
                    bail!("DATABASE MICRONS must be positive, got {value}");
                }
                units = Some(value);
                lex.skip_statement();
            }
            "END" => {
                lex.expect("UNITS")?;
                return Ok(units);
            }
            _ => lex.skip_statement(),
        }
    }
    bail!("unterminated UNITS block")
}

/// `MACRO <name> ... END <name>`.
fn parse_macro(lex: &mut Lexer<'_>) -> Result<CellDescriptor> {
    let name = lex.next().ok_or_else(|| anyhow!("MACRO without a name"))?;
    let mut size: Option<(f64, f64)> = None;
    let mut is_filler = false;

    while let Some(tok) = lex.next() {
        match tok.as_str() {
            "SIZE" => {
                let sx: f64 = lex
                    .number()
                    .with_context(|| format!("bad SIZE in MACRO {name}"))?;
                lex.expect("BY")
                    .with_context(|| format!("bad SIZE in MACRO {name}"))?;
                let sy: f64 = lex
                    .number()
                    .with_context(|| format!("bad SIZE in MACRO {name}"))?;
                size = Some((sx, sy));
                lex.skip_statement();
            }
            "CLASS" => {
                // CLASS PAD SPACER ; / CLASS CORE SPACER ; mark fillers.
                while let Some(word) = lex.next() {
                    if word == ";" {
                        break;
                    }
                    if word == "SPACER" {
                        is_filler = true;
                    }
                }
            }
            "PIN" => {
                let pin = lex
                    .next()
                    .ok_or_else(|| anyhow!("PIN without a name in MACRO {name}"))?;
                skip_pin(lex, &pin)?;
            }
            "OBS" => skip_unnamed_block(lex)?,
            "END" => {
                lex.expect(&name)
                    .with_context(|| format!("unterminated MACRO {name}"))?;
                let (size_x, size_y) =
                    size.ok_or_else(|| anyhow!("MACRO {name} has no SIZE statement"))?;
                return Ok(CellDescriptor::new(name, size_x, size_y, is_filler));
            }
            _ => lex.skip_statement(),
        }
    }
    bail!("unterminated MACRO {name}")
}

/// Consume a `PIN <name> ... END <name>` body. `PORT` sub-blocks close
/// with a bare `END`, so they need their own scan before the pin's
/// named `END` can be matched.
fn skip_pin(lex: &mut Lexer<'_>, pin: &str) -> Result<()> {
    while let Some(tok) = lex.next() {
        match tok.as_str() {
            "PORT" => skip_unnamed_block(lex)?,
            "END" => {
                lex.expect(pin)
                    .with_context(|| format!("unterminated PIN {pin}"))?;
                return Ok(());
            }
            _ => lex.skip_statement(),
        }
    }
    bail!("unterminated PIN {pin}")
}

/// Consume a block of `;`-terminated statements up to `END <name>`.
fn skip_block(lex: &mut Lexer<'_>, name: &str) -> Result<()> {
    while let Some(tok) = lex.next() {
        match tok.as_str() {
            "END" => {
                lex.expect(name)
                    .with_context(|| format!("unterminated block {name}"))?;
                return Ok(());
            }
            _ => lex.skip_statement(),
        }
    }
    bail!("unterminated block {name}")
}

/// Consume a block up to a bare `END` (the `OBS` form).
fn skip_unnamed_block(lex: &mut Lexer<'_>) -> Result<()> {
    while let Some(tok) = lex.next() {
        if tok == "END" {
            return Ok(());
        }
    }
    bail!("unterminated OBS block")
}

/// Whitespace-delimited token scanner with `;` as a standalone token and
/// `#` line comments.
struct Lexer<'a> {
    rest: &'a str,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    fn next(&mut self) -> Option<String> {
        loop {
            self.rest = self.rest.trim_start();
            if let Some(stripped) = self.rest.strip_prefix('#') {
                self.rest = match stripped.find('\n') {
                    Some(idx) => &stripped[idx + 1..],
                    None => "",
                };
                continue;
            }
            break;
        }
        if self.rest.is_empty() {
            return None;
        }
        if let Some(stripped) = self.rest.strip_prefix(';') {
            self.rest = stripped;
            return Some(";".to_string());
        }
        let end = self
            .rest
            .find(|c: char| c.is_whitespace() || c == ';')
            .unwrap_or(self.rest.len());
        let (tok, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(tok.to_string())
    }

    /// Consume tokens up to and including the next `;`.
    fn skip_statement(&mut self) {
        while let Some(tok) = self.next() {
            if tok == ";" {
                return;
            }
        }
    }

    fn expect(&mut self, want: &str) -> Result<()> {
        match self.next() {
            Some(tok) if tok == want => Ok(()),
            Some(tok) => bail!("expected {want}, got {tok}"),
            None => bail!("expected {want}, got end of file"),
        }
    }

    fn number(&mut self) -> Result<f64> {
        let tok = self
            .next()
            .ok_or_else(|| anyhow!("expected a number, got end of file"))?;
        tok.parse::<f64>()
            .map_err(|_| anyhow!("expected a number, got {tok}"))
    }
}
