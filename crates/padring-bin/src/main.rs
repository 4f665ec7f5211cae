//! Padring entrypoint: read the LEF cell library and the ring
//! configuration, solve the ring, and stream the placed cells to every
//! requested output artifact.

use anyhow::{Context, Result};
use clap::Parser;
use core_cells::{CellCatalog, FillerCatalog};
use core_config::RingConfig;
use core_layout::Ring;
use core_write::{DefWriter, Gds2Writer, RingWriter, SvgWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// DEF database units fallback when no LEF file carries a
/// `DATABASE MICRONS` statement.
const DEFAULT_DEF_UNITS: f64 = 1000.0;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name = "padring",
    version,
    about = "Generate an ASIC pad ring from LEF cells and a ring configuration"
)]
struct Args {
    /// Ring configuration file (TOML).
    config_file: PathBuf,
    /// LEF file with the pad cell library; repeatable.
    #[arg(short = 'L', long = "lef", required = true)]
    lef: Vec<PathBuf>,
    /// GDS2 output file.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,
    /// SVG output file.
    #[arg(long)]
    svg: Option<PathBuf>,
    /// DEF output file.
    #[arg(long)]
    def: Option<PathBuf>,
    /// Filler cell prefix; overrides the config file and the LEF
    /// spacer flag.
    #[arg(long)]
    filler: Option<String>,
    /// Errors only.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
    /// Debug output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(target: "padring", ?err, "aborted");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(args: &Args) {
    let default = if args.quiet {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    // RUST_LOG wins over the flags when it is set.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(args: &Args) -> Result<()> {
    info!(
        target: "padring",
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config_file.display(),
        "startup"
    );

    // Cell library; the last database-units figure read wins.
    let mut catalog = CellCatalog::new();
    let mut database_units = None;
    for lef in &args.lef {
        let summary = core_lef::parse_file(lef, &mut catalog)?;
        if summary.database_units.is_some() {
            database_units = summary.database_units;
        }
    }
    info!(target: "padring", cells = catalog.len(), "cells_read");

    let config = RingConfig::from_file(&args.config_file)?;

    let prefix = args.filler.as_deref().or(config.filler_prefix.as_deref());
    let fillers = FillerCatalog::from_catalog(&catalog, prefix)?;

    info!(
        target: "padring",
        die_width = config.die_width,
        die_height = config.die_height,
        grid = config.grid,
        pads = config.pad_count(),
        fillers = fillers.len(),
        smallest_filler = fillers.smallest_width(),
        "ring_report"
    );

    let solved = Ring::from_config(&config, &catalog)?.solve()?;

    let mut writers: Vec<Box<dyn RingWriter>> = Vec::new();
    if let Some(path) = &args.output {
        info!(target: "padring", file = %path.display(), "writing_gds2");
        let file = create(path, "GDS2")?;
        writers.push(Box::new(Gds2Writer::new(
            BufWriter::new(file),
            &config.design_name,
        )?));
    }
    if let Some(path) = &args.svg {
        info!(target: "padring", file = %path.display(), "writing_svg");
        let file = create(path, "SVG")?;
        writers.push(Box::new(SvgWriter::new(
            BufWriter::new(file),
            config.die_width,
            config.die_height,
        )?));
    }
    if let Some(path) = &args.def {
        info!(target: "padring", file = %path.display(), "writing_def");
        let file = create(path, "DEF")?;
        writers.push(Box::new(DefWriter::new(
            BufWriter::new(file),
            &config.design_name,
            config.die_width,
            config.die_height,
            database_units.unwrap_or(DEFAULT_DEF_UNITS),
        )));
    }

    // On failure the writers are dropped here unfinished; the GDS2
    // writer closes its stream syntactically from its Drop.
    let placements = solved.placements(&catalog, &fillers)?;
    for placement in &placements {
        for writer in writers.iter_mut() {
            writer.write_cell(placement)?;
        }
    }
    for writer in writers.iter_mut() {
        writer.finish()?;
    }

    info!(target: "padring", placements = placements.len(), "done");
    Ok(())
}

fn create(path: &std::path::Path, what: &str) -> Result<File> {
    File::create(path).with_context(|| format!("cannot create {what} file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const LEF: &str = r#"
UNITS
  DATABASE MICRONS 2000 ;
END UNITS

MACRO CORNER
  CLASS ENDCAP ;
  SIZE 10 BY 10 ;
END CORNER

MACRO PAD
  CLASS PAD ;
  SIZE 20 BY 30 ;
END PAD

MACRO FILL10
  CLASS PAD SPACER ;
  SIZE 10 BY 30 ;
END FILL10

END LIBRARY
"#;

    const CONFIG: &str = r#"
design = "ringtest"
die.width = 100.0
die.height = 100.0
die.grid = 1.0

north = [
  { corner = "CORNER" },
  { flex = true },
  { pad = "PAD" },
  { flex = true },
  { corner = "CORNER" },
]
south = [
  { corner = "CORNER" },
  { flex = true },
  { pad = "PAD" },
  { flex = true },
  { corner = "CORNER" },
]
east = [
  { corner = "CORNER" },
  { flex = true },
  { pad = "PAD" },
  { flex = true },
  { corner = "CORNER" },
]
west = [
  { corner = "CORNER" },
  { flex = true },
  { pad = "PAD" },
  { flex = true },
  { corner = "CORNER" },
]
"#;

    fn args(dir: &Path, config: &str, lef: &str) -> Args {
        let lef_path = dir.join("cells.lef");
        let config_path = dir.join("ring.toml");
        std::fs::write(&lef_path, lef).unwrap();
        std::fs::write(&config_path, config).unwrap();
        Args {
            config_file: config_path,
            lef: vec![lef_path],
            output: Some(dir.join("ring.gds")),
            svg: Some(dir.join("ring.svg")),
            def: Some(dir.join("ring.def")),
            filler: None,
            quiet: true,
            verbose: false,
        }
    }

    #[test]
    fn full_flow_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), CONFIG, LEF);
        run(&args).unwrap();

        let gds = std::fs::read(dir.path().join("ring.gds")).unwrap();
        // UNITS record lands right after HEADER, BGNLIB and LIBNAME.
        assert_eq!(
            &gds[52..72],
            &[
                0x00, 0x14, 0x03, 0x05, 0x3E, 0x41, 0x89, 0x37, 0x4B, 0xC6, 0xA7, 0xEF, 0x39,
                0x44, 0xB8, 0x2F, 0xA0, 0x9B, 0x5A, 0x54
            ]
        );
        // ENDSTR then ENDLIB close the stream.
        assert_eq!(
            &gds[gds.len() - 8..],
            &[0x00, 0x04, 0x07, 0x00, 0x00, 0x04, 0x04, 0x00]
        );

        let def = std::fs::read_to_string(dir.path().join("ring.def")).unwrap();
        // LEF database units flow into the DEF header.
        assert!(def.contains("UNITS DISTANCE MICRONS 2000 ;"));
        assert!(def.contains("COMPONENTS 32 ;"));

        let svg = std::fs::read_to_string(dir.path().join("ring.svg")).unwrap();
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn identical_runs_are_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), CONFIG, LEF);
        run(&args).unwrap();
        let first = std::fs::read(dir.path().join("ring.gds")).unwrap();
        run(&args).unwrap();
        let second = std::fs::read(dir.path().join("ring.gds")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_fillers_abort_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let lef = LEF.replace("CLASS PAD SPACER ;", "CLASS PAD ;");
        let args = args(dir.path(), CONFIG, &lef);
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("no filler cells"));
    }

    #[test]
    fn explicit_filler_prefix_overrides_the_flag() {
        let dir = tempfile::tempdir().unwrap();
        let lef = LEF.replace("CLASS PAD SPACER ;", "CLASS PAD ;");
        let mut args = args(dir.path(), CONFIG, &lef);
        args.filler = Some("FILL".to_string());
        run(&args).unwrap();
    }

    #[test]
    fn unfillable_gap_aborts_with_a_closed_gds() {
        let dir = tempfile::tempdir().unwrap();
        // 25 um pads leave 27/28 um flex gaps a 10 um filler cannot tile.
        let lef = LEF.replace("SIZE 20 BY 30 ;", "SIZE 25 BY 30 ;");
        let args = args(dir.path(), CONFIG, &lef);
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("cannot be closed"));

        let gds = std::fs::read(dir.path().join("ring.gds")).unwrap();
        assert_eq!(
            &gds[gds.len() - 8..],
            &[0x00, 0x04, 0x07, 0x00, 0x00, 0x04, 0x04, 0x00]
        );
    }

    #[test]
    fn unknown_pad_cell_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let config = CONFIG.replace("{ pad = \"PAD\" }", "{ pad = \"GHOST\" }");
        let args = args(dir.path(), &config, LEF);
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("GHOST"));
    }
}
