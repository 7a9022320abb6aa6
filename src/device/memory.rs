use byteorder::{ByteOrder, NativeEndian};
use std::collections::HashMap;
use std::mem::size_of;
use std::ops::{Deref, DerefMut};

/// Offsets of the 32-bit registers inside one bank's register file.
///
/// Every register holds one bit per pin, bit N belonging to offset N.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    /// Direction select, bit set means input.
    Fsel,
    /// Output latch.
    Set,
    /// Level the board pulls the pad to. Only meaningful where `Pull` is set.
    Ext,
    /// Pad has an external pull; inputs without one read back the output latch.
    Pull,
    /// Pad routed to a special function instead of GPIO.
    Mux,
    /// Line has no output driver.
    InputOnly,
}

impl Register {
    pub fn offset(self) -> usize {
        use Register::*;
        (match self {
            Fsel => 0x0,
            Set => 0x1,
            Ext => 0x2,
            Pull => 0x3,
            Mux => 0x4,
            InputOnly => 0x5,
        } * size_of::<u32>())
    }
}

#[derive(Debug)]
pub struct Memory {
    map: Vec<u8>,
    pin_leases: HashMap<u32, String>,
}

impl Memory {
    const BLOCK_SIZE: usize = 6 * size_of::<u32>();

    /// Register file in its reset state: every pin an input, nothing leased.
    pub fn new() -> Self {
        let mut memory = Self {
            map: vec![0; Self::BLOCK_SIZE],
            pin_leases: HashMap::with_capacity(8),
        };
        memory.write(Register::Fsel, u32::MAX);
        memory
    }

    pub fn read(&self, register: Register) -> u32 {
        NativeEndian::read_u32(&self[register.offset()..])
    }

    pub fn write(&mut self, register: Register, value: u32) {
        let offset = register.offset();
        NativeEndian::write_u32(&mut self[offset..], value);
    }

    pub fn bit(&self, register: Register, pin_offset: u32) -> bool {
        self.read(register) & (1 << pin_offset) != 0
    }

    pub fn set_bit(&mut self, register: Register, pin_offset: u32, on: bool) {
        let retval = self.read(register);
        if on {
            self.write(register, retval | (1 << pin_offset));
        } else {
            self.write(register, retval & !(1 << pin_offset));
        }
    }

    /// Records `label` as the owner of `pin_offset`.
    ///
    /// Returns `false` without touching the existing lease when the pin is already leased.
    pub fn lease(&mut self, pin_offset: u32, label: &str) -> bool {
        if self.pin_leases.contains_key(&pin_offset) {
            return false;
        }
        self.pin_leases.insert(pin_offset, label.to_owned());
        true
    }

    pub fn release(&mut self, pin_offset: u32) -> Option<String> {
        self.pin_leases.remove(&pin_offset)
    }

    pub fn lease_owner(&self, pin_offset: u32) -> Option<&str> {
        self.pin_leases.get(&pin_offset).map(String::as_str)
    }
}

impl Deref for Memory {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.map
    }
}

impl DerefMut for Memory {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.map
    }
}
