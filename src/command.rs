//! The `gpio` command itself: argument parsing, pin changes and exit codes.
use crate::device::{ClaimedPin, Value};
use crate::registry::Registry;
use crate::resolve::resolve;
use crate::status::show_status;
use crate::{error_chain, GpioError, GpioResult};
use log::{debug, warn};
use std::io::Write;

pub const USAGE: &str = "gpio <input|set|clear|toggle> <pin>
    - input/set/clear/toggle the specified pin
gpio status [-a] [<bank> | <pin>]  - show [all/claimed] GPIOs";

/// Label the command leases pins under.
pub const LEASE_LABEL: &str = "cmd_gpio";

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
/// Returned for malformed invocations: print the usage text, nothing was executed.
pub const EXIT_USAGE: i32 = -1;

const MAX_ARGS: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verb {
    Input,
    Set,
    Clear,
    Toggle,
}

impl Verb {
    /// Only the first character of the verb is significant.
    pub fn parse(word: &str) -> Option<Self> {
        use Verb::*;
        match word.chars().next()? {
            'i' => Some(Input),
            's' => Some(Set),
            'c' => Some(Clear),
            't' => Some(Toggle),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Invocation<'a> {
    Status {
        show_all: bool,
        filter: Option<&'a str>,
    },
    Pin {
        verb: Verb,
        pin: &'a str,
    },
}

impl<'a> Invocation<'a> {
    /// Parses the arguments following the command name.
    pub fn parse<S: AsRef<str>>(args: &'a [S]) -> GpioResult<Self> {
        let (verb, mut rest) = match args.split_first() {
            Some((verb, rest)) if args.len() <= MAX_ARGS => (verb.as_ref(), rest),
            _ => return Err(GpioError::Usage),
        };

        let show_all = matches!(rest.first(), Some(flag) if flag.as_ref() == "-a");
        if show_all {
            rest = &rest[1..];
        }
        if rest.len() > 1 {
            return Err(GpioError::Usage);
        }
        let operand: Option<&str> = rest.first().map(|operand| operand.as_ref());

        if verb == "status" {
            return Ok(Invocation::Status {
                show_all,
                filter: operand.filter(|filter| !filter.is_empty()),
            });
        }

        match (Verb::parse(verb), operand) {
            (Some(verb), Some(pin)) if !show_all => Ok(Invocation::Pin { verb, pin }),
            _ => Err(GpioError::Usage),
        }
    }
}

/// Successful result of one command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Resulting logical value of the pin that was changed or read.
    Value(Value),
    Done,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Value(value) => i32::from(value as u8),
            Outcome::Done => EXIT_SUCCESS,
        }
    }
}

pub fn exit_code(result: &GpioResult<Outcome>) -> i32 {
    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => err.exit_code(),
    }
}

/// Runs `gpio` invocations against a registry, writing user-visible output to `console`.
pub struct Dispatcher<'r, W> {
    registry: &'r mut Registry,
    console: W,
}

impl<'r, W: Write> Dispatcher<'r, W> {
    pub fn new(registry: &'r mut Registry, console: W) -> Self {
        Self { registry, console }
    }

    pub fn into_console(self) -> W {
        self.console
    }

    /// Runs one invocation, reports failures on the console and returns the exit code.
    pub fn run<S: AsRef<str>>(&mut self, args: &[S]) -> i32 {
        let result = self.execute(args);
        if let Err(err) = &result {
            self.report(err);
        }
        exit_code(&result)
    }

    /// Runs one invocation. Nothing is printed for failures.
    pub fn execute<S: AsRef<str>>(&mut self, args: &[S]) -> GpioResult<Outcome> {
        let invocation = Invocation::parse(args)?;
        debug!("executing {:?}", invocation);

        match invocation {
            Invocation::Status { show_all, filter } => {
                show_status(self.registry, show_all, filter, &mut self.console)?;
                Ok(Outcome::Done)
            }
            Invocation::Pin { verb, pin } => self.change(verb, pin).map(Outcome::Value),
        }
    }

    fn change(&mut self, verb: Verb, name: &str) -> GpioResult<Value> {
        let handle = resolve(self.registry, name).map_err(GpioError::Resolve)?;

        let mut pin = match ClaimedPin::acquire(self.registry, handle, LEASE_LABEL) {
            Ok(pin) => pin,
            Err(err) => {
                writeln!(self.console, "gpio: requesting pin {} failed", handle)
                    .map_err(GpioError::Console)?;
                return Err(err);
            }
        };

        let value = match verb {
            Verb::Input => {
                pin.make_input()?;
                pin.get_value()?
            }
            Verb::Set => Value::High,
            Verb::Clear => Value::Low,
            Verb::Toggle => !pin.get_value()?,
        };
        if verb != Verb::Input {
            pin.set_value(value)?;
        }

        writeln!(
            self.console,
            "gpio: pin {} (gpio {}) value is {}",
            name, handle, value
        )
        .map_err(GpioError::Console)?;

        Ok(value)
    }

    fn report(&mut self, err: &GpioError) {
        let written = match err {
            GpioError::Usage => writeln!(self.console, "Usage:\n{}", USAGE),
            _ => writeln!(self.console, "gpio: {}", error_chain(err)),
        };
        if let Err(io_err) = written {
            warn!("failed to report '{}': {}", err, io_err);
        }
    }
}
