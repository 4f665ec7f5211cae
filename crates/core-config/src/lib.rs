//! Ring configuration parsing.
//!
//! The configuration file is TOML: the design name, die metrics as
//! dotted `die.*` keys, an optional filler prefix, and one ordered
//! directive array per die side. Directive order in the file is
//! placement order on the die, so the arrays deserialize into `Vec`s
//! and are never re-sorted.
//!
//! Parsing is two-stage: serde derive structs mirror the file verbatim,
//! then [`RingConfig::from_str`] validates them into the domain form
//! the layout solver consumes (corners bracket every side, die area and
//! grid are usable, instance names are unique). Validation failures are
//! typed [`ConfigError`]s so the binary can report them precisely.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Smallest die edge we accept, in microns. Anything below this is an
/// unset or nonsensical die area.
pub const MIN_DIE_EDGE: f64 = 1.0e-6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("die area was not specified or is degenerate ({width} x {height} um)")]
    NoDieSize { width: f64, height: f64 },
    #[error("placement grid must be positive, got {0} um")]
    BadGrid(f64),
    #[error("side {side} must begin and end with a corner directive")]
    MissingCorner { side: &'static str },
    #[error("side {side} has a corner directive at interior position {index}")]
    MisplacedCorner { side: &'static str, index: usize },
    #[error("side {side}: fixed space width must be non-negative, got {width} um")]
    NegativeSpace { side: &'static str, width: f64 },
    #[error("side {side}: `flex = false` is meaningless; omit the entry instead")]
    BadFlex { side: &'static str },
    #[error("duplicate instance name {0}")]
    DuplicateInstance(String),
    #[error("side {side} has fewer than two directives")]
    SideTooShort { side: &'static str },
}

/// One placement directive, in the order the user wrote it.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// A corner cell; only valid as the first or last entry of a side.
    Corner { cell: String },
    /// A pad instance to place.
    Pad {
        cell: String,
        instance: String,
        flip: bool,
    },
    /// Reserve exactly `width` microns (filler-packed later).
    Space { width: f64 },
    /// Share of whatever length remains on the side.
    Flex,
}

/// Validated configuration, ready for the layout solver.
#[derive(Debug, Clone)]
pub struct RingConfig {
    pub design_name: String,
    pub die_width: f64,
    pub die_height: f64,
    pub grid: f64,
    pub filler_prefix: Option<String>,
    pub north: Vec<Directive>,
    pub south: Vec<Directive>,
    pub east: Vec<Directive>,
    pub west: Vec<Directive>,
}

impl RingConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_str(&text)?;
        info!(
            target: "config",
            file = %path.display(),
            design = config.design_name.as_str(),
            die_width = config.die_width,
            die_height = config.die_height,
            grid = config.grid,
            "config_read"
        );
        Ok(config)
    }

    pub fn from_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        file.validate()
    }

    /// Total number of pad directives across all four sides, for the
    /// startup report.
    pub fn pad_count(&self) -> usize {
        [&self.north, &self.south, &self.east, &self.west]
            .into_iter()
            .flatten()
            .filter(|d| matches!(d, Directive::Pad { .. }))
            .count()
    }
}

// --- serde mirror of the file ---------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    design: String,
    die: DieSpec,
    #[serde(rename = "filler-prefix")]
    filler_prefix: Option<String>,
    north: Vec<DirectiveSpec>,
    south: Vec<DirectiveSpec>,
    east: Vec<DirectiveSpec>,
    west: Vec<DirectiveSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DieSpec {
    width: f64,
    height: f64,
    grid: f64,
}

/// Raw directive entry. Untagged: the distinguishing key (`corner`,
/// `pad`, `space`, `flex`) selects the variant.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DirectiveSpec {
    Corner {
        corner: String,
    },
    Pad {
        pad: String,
        name: Option<String>,
        #[serde(default)]
        flip: bool,
    },
    Space {
        space: f64,
    },
    Flex {
        flex: bool,
    },
}

impl ConfigFile {
    fn validate(self) -> Result<RingConfig, ConfigError> {
        if self.die.width < MIN_DIE_EDGE || self.die.height < MIN_DIE_EDGE {
            return Err(ConfigError::NoDieSize {
                width: self.die.width,
                height: self.die.height,
            });
        }
        if self.die.grid <= 0.0 {
            return Err(ConfigError::BadGrid(self.die.grid));
        }

        let mut seen = std::collections::BTreeSet::new();
        let north = validate_side("north", "n", self.north, &mut seen)?;
        let south = validate_side("south", "s", self.south, &mut seen)?;
        let east = validate_side("east", "e", self.east, &mut seen)?;
        let west = validate_side("west", "w", self.west, &mut seen)?;

        Ok(RingConfig {
            design_name: self.design,
            die_width: self.die.width,
            die_height: self.die.height,
            grid: self.die.grid,
            filler_prefix: self.filler_prefix,
            north,
            south,
            east,
            west,
        })
    }
}

fn validate_side(
    side: &'static str,
    letter: &str,
    specs: Vec<DirectiveSpec>,
    seen: &mut std::collections::BTreeSet<String>,
) -> Result<Vec<Directive>, ConfigError> {
    if specs.len() < 2 {
        return Err(ConfigError::SideTooShort { side });
    }
    let last = specs.len() - 1;
    let mut out = Vec::with_capacity(specs.len());
    let mut pad_ordinal = 0usize;

    for (index, spec) in specs.into_iter().enumerate() {
        let directive = match spec {
            DirectiveSpec::Corner { corner } => {
                if index != 0 && index != last {
                    return Err(ConfigError::MisplacedCorner { side, index });
                }
                Directive::Corner { cell: corner }
            }
            DirectiveSpec::Pad { pad, name, flip } => {
                let instance = name.unwrap_or_else(|| format!("{pad}_{letter}{pad_ordinal}"));
                pad_ordinal += 1;
                if !seen.insert(instance.clone()) {
                    return Err(ConfigError::DuplicateInstance(instance));
                }
                Directive::Pad {
                    cell: pad,
                    instance,
                    flip,
                }
            }
            DirectiveSpec::Space { space } => {
                if space < 0.0 {
                    return Err(ConfigError::NegativeSpace { side, width: space });
                }
                Directive::Space { width: space }
            }
            DirectiveSpec::Flex { flex } => {
                if !flex {
                    return Err(ConfigError::BadFlex { side });
                }
                Directive::Flex
            }
        };
        out.push(directive);
    }

    let bracketed = matches!(out.first(), Some(Directive::Corner { .. }))
        && matches!(out.last(), Some(Directive::Corner { .. }));
    if !bracketed {
        return Err(ConfigError::MissingCorner { side });
    }
    debug!(target: "config", side, directives = out.len(), "side_parsed");
    Ok(out)
}
