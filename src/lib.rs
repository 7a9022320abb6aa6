//! The `gpio` command of a boot loader, as a library.
//!
//! Operators use it to query and change single GPIO pins and to list the pins of every GPIO bank:
//!
//! ```text
//! gpio <input|set|clear|toggle> <pin>
//! gpio status [-a] [<bank> | <pin>]
//! ```
//!
//! Pins live in banks (`GpioBank` implementations) held by an explicit `Registry`. The registry is
//! handed to a `Dispatcher`, which parses an invocation, resolves the pin name, leases the pin for
//! the duration of the command and reports on a console writer. `RegisterBank` is a bank backed by
//! an in-memory register file; `BoardConfig` builds a registry of those from a TOML description.
//!
//! Leased pins (`ClaimedPin`) implement the [`embedded_hal`](https://crates.io/crates/embedded-hal)
//! digital traits, so generic driver code can be pointed at a pin of the registry.

use std::error::Error as StdError;
use std::io;
use thiserror::Error;

mod command;
mod config;
mod device;
mod pin_map;
mod registry;
mod resolve;
mod status;

pub use command::{
    exit_code, Dispatcher, Invocation, Outcome, Verb, EXIT_FAILURE, EXIT_SUCCESS, EXIT_USAGE,
    LEASE_LABEL, USAGE,
};
pub use config::{board_registry, BankConfig, BoardConfig, ConfigError, PinConfig};
pub use device::error::{DriverError, DriverResult};
pub use device::{ClaimedPin, Claim, Direction, GpioBank, PinFunction, RegisterBank, Value};
pub use pin_map::PadId;
pub use registry::{BankDescriptor, Banks, Mode, PinHandle, Registry};
pub use resolve::{resolve, ResolveError};
pub use status::show_status;

/// Main error type for this crate.
///
/// For more details, see `ResolveError`, `DriverError` and `ConfigError` documentation.
#[derive(Error, Debug)]
pub enum GpioError {
    #[error("invalid invocation")]
    Usage,
    #[error("failed to resolve pin")]
    Resolve(#[source] ResolveError),
    #[error("error while operating on a pin")]
    Driver(#[source] DriverError),
    #[error("failed to write to the console")]
    Console(#[source] io::Error),
    #[error("invalid board configuration")]
    Config(#[source] ConfigError),
}

impl GpioError {
    pub fn exit_code(&self) -> i32 {
        match self {
            GpioError::Usage => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// Formats an error followed by all of its sources, `outer: inner: innermost`.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_chain_lists_sources() {
        let err = GpioError::Driver(DriverError::InputOnly(3));
        assert_eq!(
            error_chain(&err),
            "error while operating on a pin: offset 3 is input-only"
        );
    }
}
