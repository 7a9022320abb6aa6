//! Board descriptions: which banks exist and what state their pins are in at reset.
use crate::device::error::DriverError;
use crate::device::{GpioBank, RegisterBank, Value};
use crate::registry::{Mode, Registry};
use crate::{GpioError, GpioResult};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BUILTIN_BOARD: &str = include_str!("../boards/mx6sl.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read board file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse board description")]
    Parse(#[source] toml::de::Error),
    #[error("invalid bank #{index}")]
    Bank {
        index: usize,
        #[source]
        source: DriverError,
    },
    #[error("pin level must be 0 or 1, got {0}")]
    Level(u8),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BoardConfig {
    #[serde(default)]
    pub mode: Mode,
    /// Reject legacy pin names without leading digits instead of reading them as pin 0.
    #[serde(default)]
    pub strict_numeric: bool,
    #[serde(default, rename = "bank")]
    pub banks: Vec<BankConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BankConfig {
    pub name: Option<String>,
    pub pins: u32,
    #[serde(default)]
    pub status_strings: bool,
    #[serde(default, rename = "pin")]
    pub overrides: Vec<PinConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PinConfig {
    pub offset: u32,
    /// Level on the pad while it is an input.
    pub level: Option<u8>,
    /// Makes the pin an output driving this level.
    pub output: Option<u8>,
    #[serde(default)]
    pub special: bool,
    #[serde(default)]
    pub input_only: bool,
    pub claimed_by: Option<String>,
}

impl BoardConfig {
    /// The i.MX6 SoloLite board shipped with the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_BOARD)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(ConfigError::Parse)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("loading board from {}", path.display());
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn build(&self) -> Result<Registry, ConfigError> {
        let mut registry = Registry::new(self.mode).with_strict_numeric(self.strict_numeric);
        for (index, bank) in self.banks.iter().enumerate() {
            registry.register(bank.build(index)?);
        }
        Ok(registry)
    }
}

impl BankConfig {
    fn build(&self, index: usize) -> Result<RegisterBank, ConfigError> {
        let bank_error = |source| ConfigError::Bank { index, source };

        let mut bank = RegisterBank::new(self.name.as_deref(), self.pins)
            .map_err(bank_error)?
            .with_status_strings(self.status_strings);

        for pin in &self.overrides {
            if let Some(level) = pin.level {
                bank.set_external_level(pin.offset, level_value(level)?)
                    .map_err(bank_error)?;
            }
            if let Some(owner) = &pin.claimed_by {
                bank.request(pin.offset, owner).map_err(bank_error)?;
            }
            if let Some(level) = pin.output {
                bank.direction_output(pin.offset, level_value(level)?)
                    .map_err(bank_error)?;
            }
            if pin.input_only {
                bank.set_input_only(pin.offset).map_err(bank_error)?;
            }
            if pin.special {
                bank.route_special(pin.offset).map_err(bank_error)?;
            }
        }

        Ok(bank)
    }
}

/// Registry for the board described at `path`, or for the built-in board.
pub fn board_registry(path: Option<&Path>) -> GpioResult<Registry> {
    let board = match path {
        Some(path) => BoardConfig::load(path),
        None => BoardConfig::builtin(),
    }
    .map_err(GpioError::Config)?;
    board.build().map_err(GpioError::Config)
}

fn level_value(level: u8) -> Result<Value, ConfigError> {
    Value::try_from(level).map_err(ConfigError::Level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::PinFunction;
    use crate::registry::PinHandle;

    #[test]
    fn builtin_board_has_five_banks() {
        let registry = BoardConfig::builtin().unwrap().build().unwrap();
        let names: Vec<_> = registry
            .banks()
            .unwrap()
            .map(|(desc, _)| desc.name.unwrap_or_default().to_owned())
            .collect();
        assert_eq!(names, ["GPIO1_", "GPIO2_", "GPIO3_", "GPIO4_", "GPIO5_"]);
        assert_eq!(registry.pin_total(), 160);
    }

    #[test]
    fn pin_overrides_are_applied() {
        let board = BoardConfig::from_toml_str(
            r#"
            [[bank]]
            name = "A"
            pins = 4

            [[bank.pin]]
            offset = 0
            claimed-by = "led"
            output = 1

            [[bank.pin]]
            offset = 1
            level = 1

            [[bank.pin]]
            offset = 2
            special = true
            "#,
        )
        .unwrap();
        let registry = board.build().unwrap();
        assert_eq!(registry.mode(), Mode::DriverModel);

        let (bank, offset) = registry.locate(PinHandle::new(0)).unwrap();
        assert_eq!(bank.get_function(offset), Some(PinFunction::Output as u8));
        assert_eq!(bank.get_value(offset), Ok(Value::High));

        let (bank, offset) = registry.locate(PinHandle::new(1)).unwrap();
        assert_eq!(bank.get_value(offset), Ok(Value::High));

        let (bank, offset) = registry.locate(PinHandle::new(2)).unwrap();
        assert_eq!(bank.get_function(offset), Some(PinFunction::Func as u8));
    }

    #[test]
    fn legacy_mode_and_strictness() {
        let board = BoardConfig::from_toml_str(
            r#"
            mode = "legacy"
            strict-numeric = true
            "#,
        )
        .unwrap();
        let registry = board.build().unwrap();
        assert_eq!(registry.mode(), Mode::Legacy);
        assert!(registry.strict_numeric());
    }

    #[test]
    fn board_files_are_loaded_from_disk() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[bank]]\nname = \"X\"\npins = 3").unwrap();

        let registry = board_registry(Some(file.path())).unwrap();
        assert_eq!(registry.pin_total(), 3);
        assert!(matches!(
            board_registry(Some(Path::new("/nonexistent/board.toml"))),
            Err(GpioError::Config(ConfigError::Read { .. }))
        ));
    }

    #[test]
    fn invalid_entries_are_rejected() {
        let too_wide = BoardConfig::from_toml_str("[[bank]]\npins = 40\n").unwrap();
        assert!(matches!(
            too_wide.build(),
            Err(ConfigError::Bank {
                index: 0,
                source: DriverError::BankTooWide(40)
            })
        ));

        let bad_level =
            BoardConfig::from_toml_str("[[bank]]\npins = 4\n[[bank.pin]]\noffset = 0\nlevel = 2\n")
                .unwrap();
        assert!(matches!(bad_level.build(), Err(ConfigError::Level(2))));

        assert!(matches!(
            BoardConfig::from_toml_str("[[bank]]\npins = 4\ncolour = \"red\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}
