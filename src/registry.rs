//! Explicit registry of GPIO banks.
//!
//! Banks are kept in registration order. Each bank gets a base number so that every pin also has a
//! global number (`PinHandle`), the same numbering the legacy command uses.
use crate::device::GpioBank;
use log::debug;
use serde::Deserialize;
use std::fmt;

/// How pins can be addressed.
///
/// `DriverModel` has a structured bank registry: pins resolve by bank name and banks can be listed.
/// `Legacy` only knows global pin numbers and cannot list banks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    DriverModel,
    Legacy,
}

/// Global number of one pin. Only meaningful for the registry it was resolved against.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PinHandle(u32);

impl PinHandle {
    pub fn new(number: u32) -> Self {
        Self(number)
    }

    pub fn number(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PinHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BankDescriptor<'a> {
    pub name: Option<&'a str>,
    pub pin_count: u32,
    pub ordinal: usize,
    pub base: u32,
}

impl<'a> BankDescriptor<'a> {
    pub fn handle(&self, offset: u32) -> PinHandle {
        PinHandle(self.base + offset)
    }
}

pub struct Registry {
    mode: Mode,
    strict_numeric: bool,
    banks: Vec<Box<dyn GpioBank>>,
}

impl Registry {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            strict_numeric: false,
            banks: Vec::new(),
        }
    }

    /// Rejects non-numeric legacy pin names instead of reading them as pin 0.
    pub fn with_strict_numeric(mut self, strict: bool) -> Self {
        self.strict_numeric = strict;
        self
    }

    pub fn register<B: GpioBank + 'static>(&mut self, bank: B) -> &mut Self {
        debug!(
            "registered bank #{} {:?} with {} pins",
            self.banks.len(),
            bank.bank_name(),
            bank.pin_count()
        );
        self.banks.push(Box::new(bank));
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn strict_numeric(&self) -> bool {
        self.strict_numeric
    }

    pub fn pin_total(&self) -> u32 {
        self.banks.iter().map(|bank| bank.pin_count()).sum()
    }

    /// Lists banks in registration order, or `None` when the registry cannot enumerate banks.
    pub fn banks(&self) -> Option<Banks<'_>> {
        match self.mode {
            Mode::DriverModel => Some(Banks {
                registry: self,
                ordinal: 0,
                base: 0,
            }),
            Mode::Legacy => None,
        }
    }

    pub fn bank(&self, ordinal: usize) -> Option<&dyn GpioBank> {
        self.banks.get(ordinal).map(|bank| bank.as_ref())
    }

    /// Bank and bank-relative offset behind a global pin number.
    pub fn locate(&self, handle: PinHandle) -> Option<(&dyn GpioBank, u32)> {
        let (ordinal, offset) = self.position(handle)?;
        Some((self.banks[ordinal].as_ref(), offset))
    }

    pub fn locate_mut(
        &mut self,
        handle: PinHandle,
    ) -> Option<(&mut (dyn GpioBank + 'static), u32)> {
        let (ordinal, offset) = self.position(handle)?;
        Some((self.banks[ordinal].as_mut(), offset))
    }

    fn position(&self, handle: PinHandle) -> Option<(usize, u32)> {
        let mut base = 0;
        for (ordinal, bank) in self.banks.iter().enumerate() {
            let count = bank.pin_count();
            if handle.0 < base + count {
                return Some((ordinal, handle.0 - base));
            }
            base += count;
        }
        None
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("mode", &self.mode)
            .field("strict_numeric", &self.strict_numeric)
            .field("banks", &self.banks.len())
            .finish()
    }
}

/// Iterator over registered banks, see `Registry::banks`.
pub struct Banks<'a> {
    registry: &'a Registry,
    ordinal: usize,
    base: u32,
}

impl<'a> Iterator for Banks<'a> {
    type Item = (BankDescriptor<'a>, &'a dyn GpioBank);

    fn next(&mut self) -> Option<Self::Item> {
        let bank = self.registry.banks.get(self.ordinal)?.as_ref();
        let descriptor = BankDescriptor {
            name: bank.bank_name(),
            pin_count: bank.pin_count(),
            ordinal: self.ordinal,
            base: self.base,
        };
        self.ordinal += 1;
        self.base += descriptor.pin_count;
        Some((descriptor, bank))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RegisterBank;

    fn registry(mode: Mode) -> Registry {
        let mut registry = Registry::new(mode);
        registry
            .register(RegisterBank::new(Some("A"), 4).unwrap())
            .register(RegisterBank::new(Some("EMPTY"), 0).unwrap())
            .register(RegisterBank::new(Some("B"), 8).unwrap());
        registry
    }

    #[test]
    fn banks_come_in_registration_order_with_bases() {
        let registry = registry(Mode::DriverModel);
        let banks: Vec<_> = registry.banks().unwrap().map(|(desc, _)| desc).collect();

        assert_eq!(banks.len(), 3);
        assert_eq!(banks[0].name, Some("A"));
        assert_eq!(banks[1].pin_count, 0);
        assert_eq!(banks[2].ordinal, 2);
        assert_eq!(banks[2].base, 4);
        assert_eq!(banks[2].handle(3), PinHandle::new(7));
    }

    #[test]
    fn legacy_registry_does_not_enumerate() {
        assert!(registry(Mode::Legacy).banks().is_none());
    }

    #[test]
    fn global_numbers_skip_empty_banks() {
        let registry = registry(Mode::DriverModel);
        let (bank, offset) = registry.locate(PinHandle::new(5)).unwrap();
        assert_eq!(bank.bank_name(), Some("B"));
        assert_eq!(offset, 1);
        assert!(registry.locate(PinHandle::new(12)).is_none());
        assert_eq!(registry.pin_total(), 12);
    }
}
