use thiserror::Error;

/// Enum representing possible failures reported by a bank driver.
///
/// - NoSuchPin - A global pin number does not fall into any registered bank.
/// - OffsetOutOfRange - A bank was asked about an offset past its last pin.
/// - PinMuxed - The pad is routed to a special function and cannot be requested as GPIO.
/// - InputOnly - The line has no output driver.
/// - BankTooWide - A register bank was configured with more pins than its 32-bit registers hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("no bank provides gpio {0}")]
    NoSuchPin(u32),
    #[error("offset {offset} is out of range for a bank of {pin_count} pins")]
    OffsetOutOfRange { offset: u32, pin_count: u32 },
    #[error("offset {0} is routed to a special function")]
    PinMuxed(u32),
    #[error("offset {0} is input-only")]
    InputOnly(u32),
    #[error("bank of {0} pins does not fit into 32-bit registers")]
    BankTooWide(u32),
}

pub type DriverResult<T> = Result<T, DriverError>;
