use super::error::DriverError;
use super::{Claim, GpioBank};
use crate::registry::{PinHandle, Registry};
use crate::{GpioError, GpioResult};
use derive_try_from_primitive::TryFromPrimitive;
use embedded_hal::digital::v2 as eh;
use log::{debug, warn};
use std::fmt;
use std::ops::Not;

/// Enum representing the logical state of a given pin.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
pub enum Value {
    High = 1,
    Low = 0,
}

impl From<bool> for Value {
    fn from(high: bool) -> Self {
        if high {
            Value::High
        } else {
            Value::Low
        }
    }
}

impl Not for Value {
    type Output = Value;

    fn not(self) -> Self::Output {
        match self {
            Value::High => Value::Low,
            Value::Low => Value::High,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Lease over one pin for the duration of a command.
///
/// Obtained with `ClaimedPin::acquire`. If the bank reported the pin as already held by another
/// owner the guard still gives access to the pin, but dropping it leaves that lease in place.
/// A lease taken by the guard itself is freed on drop, also when an operation failed half-way.
pub struct ClaimedPin<'r> {
    bank: &'r mut (dyn GpioBank + 'static),
    handle: PinHandle,
    offset: u32,
    claim: Claim,
}

impl<'r> ClaimedPin<'r> {
    pub fn acquire(registry: &'r mut Registry, handle: PinHandle, label: &str) -> GpioResult<Self> {
        let (bank, offset) = registry
            .locate_mut(handle)
            .ok_or(DriverError::NoSuchPin(handle.number()))
            .map_err(GpioError::Driver)?;
        let claim = bank.request(offset, label).map_err(GpioError::Driver)?;
        debug!("gpio {} requested by {}: {:?}", handle, label, claim);

        Ok(Self {
            bank,
            handle,
            offset,
            claim,
        })
    }

    pub fn handle(&self) -> PinHandle {
        self.handle
    }

    pub fn claim(&self) -> Claim {
        self.claim
    }

    pub fn make_input(&mut self) -> GpioResult<()> {
        self.bank
            .direction_input(self.offset)
            .map_err(GpioError::Driver)
    }

    pub fn get_value(&self) -> GpioResult<Value> {
        self.bank.get_value(self.offset).map_err(GpioError::Driver)
    }

    /// Switches the pin to output and drives `value`.
    pub fn set_value(&mut self, value: Value) -> GpioResult<()> {
        self.bank
            .direction_output(self.offset, value)
            .map_err(GpioError::Driver)
    }
}

impl<'r> Drop for ClaimedPin<'r> {
    fn drop(&mut self) {
        if self.claim == Claim::AlreadyHeld {
            return;
        }

        if let Err(err) = self.bank.free(self.offset) {
            warn!("failed to release gpio {}: {}", self.handle, err);
        }
    }
}

impl<'r> fmt::Debug for ClaimedPin<'r> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimedPin")
            .field("handle", &self.handle)
            .field("offset", &self.offset)
            .field("claim", &self.claim)
            .finish()
    }
}

impl<'r> eh::InputPin for ClaimedPin<'r> {
    type Error = GpioError;

    fn is_high(&self) -> Result<bool, GpioError> {
        Ok(self.get_value()? == Value::High)
    }

    fn is_low(&self) -> Result<bool, GpioError> {
        self.is_high().map(|v| !v)
    }
}

impl<'r> eh::OutputPin for ClaimedPin<'r> {
    type Error = GpioError;

    fn set_low(&mut self) -> Result<(), GpioError> {
        self.set_value(Value::Low)
    }

    fn set_high(&mut self) -> Result<(), GpioError> {
        self.set_value(Value::High)
    }
}

impl<'r> eh::StatefulOutputPin for ClaimedPin<'r> {
    fn is_set_high(&self) -> Result<bool, GpioError> {
        Ok(self.get_value()? == Value::High)
    }

    fn is_set_low(&self) -> Result<bool, GpioError> {
        self.is_set_high().map(|v| !v)
    }
}

impl<'r> eh::ToggleableOutputPin for ClaimedPin<'r> {
    type Error = GpioError;

    fn toggle(&mut self) -> Result<(), GpioError> {
        let value = !self.get_value()?;
        self.set_value(value)
    }
}
