use derive_try_from_primitive::TryFromPrimitive;
use log::debug;

pub mod error;
mod memory;
mod pin;

use error::{DriverError, DriverResult};
use memory::{Memory, Register};

pub use pin::{ClaimedPin, Direction, Value};

/// Outcome of requesting a pin from its bank.
///
/// `AlreadyHeld` is not a failure: the caller may use the pin, but must not free it afterwards
/// since the lease belongs to someone else.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Claim {
    Acquired,
    AlreadyHeld,
}

/// Current electrical role of a pin, as reported by its driver.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
pub enum PinFunction {
    Input = 0,
    Output = 1,
    Unused = 2,
    Unknown = 3,
    Func = 4,
}

impl PinFunction {
    /// Fixed label printed in status lines.
    pub fn label(self) -> &'static str {
        use PinFunction::*;
        match self {
            Input => "input",
            Output => "output",
            Unused => "unused",
            Unknown => "unknown",
            Func => "func",
        }
    }

    /// Classifies a raw function code. Missing or unrecognised codes are `Unknown`.
    pub fn from_code(code: Option<u8>) -> Self {
        code.and_then(|code| Self::try_from(code).ok())
            .unwrap_or(PinFunction::Unknown)
    }
}

/// Driver interface of one GPIO bank (controller).
///
/// Offsets are bank-relative. `get_function` and `get_state` are optional capabilities:
/// a driver that cannot answer them keeps the default `None`.
pub trait GpioBank {
    /// Name prefix of the bank's pins, e.g. `GPIO4_`. Unnamed banks are only listed in full.
    fn bank_name(&self) -> Option<&str>;

    fn pin_count(&self) -> u32;

    /// Takes exclusive ownership of a pin for `label`.
    fn request(&mut self, offset: u32, label: &str) -> DriverResult<Claim>;

    fn free(&mut self, offset: u32) -> DriverResult<()>;

    fn direction_input(&mut self, offset: u32) -> DriverResult<()>;

    /// Switches a pin to output, driving `value`.
    fn direction_output(&mut self, offset: u32, value: Value) -> DriverResult<()>;

    fn get_value(&self, offset: u32) -> DriverResult<Value>;

    /// Raw function code, see `PinFunction` for the known values.
    fn get_function(&self, _offset: u32) -> Option<u8> {
        None
    }

    /// Free-form, single line description of the pin.
    fn get_state(&self, _offset: u32) -> Option<DriverResult<String>> {
        None
    }
}

/// A bank backed by a private register file.
///
/// Pins reset to inputs. An input reads the level configured with `set_external_level`, or its
/// output latch when the pad has no external pull. Outputs read back their latch. Pads routed to a special function report `PinFunction::Func` and refuse requests.
#[derive(Debug)]
pub struct RegisterBank {
    name: Option<String>,
    pin_count: u32,
    memory: Memory,
    status_strings: bool,
}

impl RegisterBank {
    pub const MAX_PINS: u32 = 32;

    pub fn new(name: Option<&str>, pin_count: u32) -> DriverResult<Self> {
        if pin_count > Self::MAX_PINS {
            return Err(DriverError::BankTooWide(pin_count));
        }

        Ok(Self {
            name: name.map(str::to_owned),
            pin_count,
            memory: Memory::new(),
            status_strings: false,
        })
    }

    /// Makes the bank describe its pins through `GpioBank::get_state`.
    pub fn with_status_strings(mut self, enabled: bool) -> Self {
        self.status_strings = enabled;
        self
    }

    pub fn set_external_level(&mut self, offset: u32, value: Value) -> DriverResult<()> {
        self.check(offset)?;
        self.memory.set_bit(Register::Ext, offset, value == Value::High);
        self.memory.set_bit(Register::Pull, offset, true);
        Ok(())
    }

    pub fn route_special(&mut self, offset: u32) -> DriverResult<()> {
        self.check(offset)?;
        self.memory.set_bit(Register::Mux, offset, true);
        Ok(())
    }

    pub fn set_input_only(&mut self, offset: u32) -> DriverResult<()> {
        self.check(offset)?;
        self.memory.set_bit(Register::InputOnly, offset, true);
        Ok(())
    }

    /// Label of the current lease holder, if any.
    pub fn owner(&self, offset: u32) -> Option<&str> {
        self.memory.lease_owner(offset)
    }

    pub fn direction(&self, offset: u32) -> DriverResult<Direction> {
        self.check(offset)?;
        Ok(self.mode(offset))
    }

    fn mode(&self, offset: u32) -> Direction {
        if self.memory.bit(Register::Fsel, offset) {
            Direction::Input
        } else {
            Direction::Output
        }
    }

    fn function(&self, offset: u32) -> PinFunction {
        if self.memory.bit(Register::Mux, offset) {
            PinFunction::Func
        } else if self.owner(offset).is_none() {
            PinFunction::Unused
        } else {
            match self.mode(offset) {
                Direction::Input => PinFunction::Input,
                Direction::Output => PinFunction::Output,
            }
        }
    }

    fn check(&self, offset: u32) -> DriverResult<()> {
        if offset < self.pin_count {
            Ok(())
        } else {
            Err(DriverError::OffsetOutOfRange {
                offset,
                pin_count: self.pin_count,
            })
        }
    }
}

impl GpioBank for RegisterBank {
    fn bank_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn pin_count(&self) -> u32 {
        self.pin_count
    }

    fn request(&mut self, offset: u32, label: &str) -> DriverResult<Claim> {
        self.check(offset)?;
        if self.memory.bit(Register::Mux, offset) {
            return Err(DriverError::PinMuxed(offset));
        }

        if self.memory.lease(offset, label) {
            debug!("offset {} leased to {}", offset, label);
            Ok(Claim::Acquired)
        } else {
            debug!(
                "offset {} already leased to {}",
                offset,
                self.owner(offset).unwrap_or_default()
            );
            Ok(Claim::AlreadyHeld)
        }
    }

    fn free(&mut self, offset: u32) -> DriverResult<()> {
        self.check(offset)?;
        if let Some(label) = self.memory.release(offset) {
            debug!("offset {} released by {}", offset, label);
        }
        Ok(())
    }

    fn direction_input(&mut self, offset: u32) -> DriverResult<()> {
        self.check(offset)?;
        self.memory.set_bit(Register::Fsel, offset, true);
        Ok(())
    }

    fn direction_output(&mut self, offset: u32, value: Value) -> DriverResult<()> {
        self.check(offset)?;
        if self.memory.bit(Register::InputOnly, offset) {
            return Err(DriverError::InputOnly(offset));
        }

        // Latch first so the pad never glitches to the old level.
        self.memory.set_bit(Register::Set, offset, value == Value::High);
        self.memory.set_bit(Register::Fsel, offset, false);
        Ok(())
    }

    fn get_value(&self, offset: u32) -> DriverResult<Value> {
        self.check(offset)?;
        let register = match self.mode(offset) {
            Direction::Input if self.memory.bit(Register::Pull, offset) => Register::Ext,
            _ => Register::Set,
        };
        Ok(Value::from(self.memory.bit(register, offset)))
    }

    fn get_function(&self, offset: u32) -> Option<u8> {
        self.check(offset).ok()?;
        Some(self.function(offset) as u8)
    }

    fn get_state(&self, offset: u32) -> Option<DriverResult<String>> {
        if !self.status_strings {
            return None;
        }

        Some(self.get_value(offset).map(|value| {
            let owner = self.owner(offset);
            format!(
                "{}{}: {}: {} [{}]{}{}",
                self.bank_name().unwrap_or_default(),
                offset,
                self.function(offset).label(),
                value as u8,
                if owner.is_some() { 'x' } else { ' ' },
                if owner.is_some() { " " } else { "" },
                owner.unwrap_or_default()
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> RegisterBank {
        RegisterBank::new(Some("GPIO1_"), 8).unwrap()
    }

    #[test]
    fn function_codes_outside_table_are_unknown() {
        assert_eq!(PinFunction::from_code(Some(1)), PinFunction::Output);
        assert_eq!(PinFunction::from_code(Some(4)), PinFunction::Func);
        assert_eq!(PinFunction::from_code(Some(5)), PinFunction::Unknown);
        assert_eq!(PinFunction::from_code(None), PinFunction::Unknown);
    }

    #[test]
    fn rejects_banks_wider_than_registers() {
        assert_eq!(
            RegisterBank::new(None, 33).unwrap_err(),
            DriverError::BankTooWide(33)
        );
    }

    #[test]
    fn inputs_read_external_level_and_outputs_read_latch() {
        let mut bank = bank();
        bank.set_external_level(2, Value::High).unwrap();
        assert_eq!(bank.get_value(2).unwrap(), Value::High);

        bank.direction_output(2, Value::Low).unwrap();
        assert_eq!(bank.get_value(2).unwrap(), Value::Low);
        assert_eq!(bank.direction(2), Ok(Direction::Output));

        bank.direction_input(2).unwrap();
        assert_eq!(bank.get_value(2).unwrap(), Value::High);
    }

    #[test]
    fn unpulled_inputs_keep_the_driven_level() {
        let mut bank = bank();
        bank.direction_output(3, Value::High).unwrap();
        bank.direction_input(3).unwrap();
        assert_eq!(bank.get_value(3).unwrap(), Value::High);

        bank.set_external_level(3, Value::Low).unwrap();
        assert_eq!(bank.get_value(3).unwrap(), Value::Low);
    }

    #[test]
    fn function_follows_lease_and_direction() {
        let mut bank = bank();
        assert_eq!(bank.get_function(0), Some(PinFunction::Unused as u8));

        assert_eq!(bank.request(0, "led").unwrap(), Claim::Acquired);
        assert_eq!(bank.get_function(0), Some(PinFunction::Input as u8));

        bank.direction_output(0, Value::High).unwrap();
        assert_eq!(bank.get_function(0), Some(PinFunction::Output as u8));

        bank.route_special(1).unwrap();
        assert_eq!(bank.get_function(1), Some(PinFunction::Func as u8));
    }

    #[test]
    fn request_reports_existing_lease() {
        let mut bank = bank();
        bank.request(3, "ethernet").unwrap();
        assert_eq!(bank.request(3, "cmd_gpio").unwrap(), Claim::AlreadyHeld);
        assert_eq!(bank.owner(3), Some("ethernet"));
    }

    #[test]
    fn special_function_pads_refuse_requests() {
        let mut bank = bank();
        bank.route_special(5).unwrap();
        assert_eq!(bank.request(5, "cmd_gpio"), Err(DriverError::PinMuxed(5)));
    }

    #[test]
    fn input_only_lines_cannot_drive() {
        let mut bank = bank();
        bank.set_input_only(6).unwrap();
        assert_eq!(
            bank.direction_output(6, Value::High),
            Err(DriverError::InputOnly(6))
        );
    }

    #[test]
    fn offsets_past_the_bank_are_rejected() {
        let bank = bank();
        assert_eq!(
            bank.get_value(8),
            Err(DriverError::OffsetOutOfRange {
                offset: 8,
                pin_count: 8
            })
        );
        assert_eq!(bank.get_function(8), None);
        assert_eq!(
            bank.direction(40),
            Err(DriverError::OffsetOutOfRange {
                offset: 40,
                pin_count: 8
            })
        );
    }

    #[test]
    fn status_strings_mention_owner() {
        let mut bank = bank().with_status_strings(true);
        bank.request(4, "cmd_gpio").unwrap();
        bank.direction_output(4, Value::High).unwrap();

        assert_eq!(
            bank.get_state(4).unwrap().unwrap(),
            "GPIO1_4: output: 1 [x] cmd_gpio"
        );
        assert_eq!(bank.get_state(5).unwrap().unwrap(), "GPIO1_5: unused: 0 [ ]");
    }

    #[test]
    fn status_strings_are_off_by_default() {
        assert!(bank().get_state(0).is_none());
    }
}
