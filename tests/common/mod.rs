#![allow(dead_code)]

use gpio_cmd::{
    BoardConfig, Claim, Dispatcher, DriverError, DriverResult, GpioBank, PinHandle, Registry,
    Value,
};
use std::cell::Cell;
use std::rc::Rc;

/// Registry of the built-in board.
pub fn board() -> Registry {
    BoardConfig::builtin().unwrap().build().unwrap()
}

pub fn board_from(toml: &str) -> Registry {
    BoardConfig::from_toml_str(toml).unwrap().build().unwrap()
}

/// Runs one invocation, returning its exit code and console output.
pub fn run(registry: &mut Registry, args: &[&str]) -> (i32, String) {
    let mut dispatcher = Dispatcher::new(registry, Vec::new());
    let code = dispatcher.run(args);
    (code, String::from_utf8(dispatcher.into_console()).unwrap())
}

pub fn function(registry: &Registry, number: u32) -> Option<u8> {
    let (bank, offset) = registry.locate(PinHandle::new(number)).unwrap();
    bank.get_function(offset)
}

pub fn value(registry: &Registry, number: u32) -> Value {
    let (bank, offset) = registry.locate(PinHandle::new(number)).unwrap();
    bank.get_value(offset).unwrap()
}

/// Bank without the optional driver capabilities, counting every call made to it.
pub struct FakeBank {
    name: Option<&'static str>,
    values: Vec<Value>,
    state: Option<&'static str>,
    failing_reads: bool,
    calls: Rc<Cell<usize>>,
}

impl FakeBank {
    pub fn new(name: Option<&'static str>, pins: usize) -> Self {
        Self {
            name,
            values: vec![Value::Low; pins],
            state: None,
            failing_reads: false,
            calls: Rc::new(Cell::new(0)),
        }
    }

    /// Makes every pin describe itself with `state`.
    pub fn with_state(mut self, state: &'static str) -> Self {
        self.state = Some(state);
        self
    }

    /// Makes value and state queries fail for every pin.
    pub fn with_failing_reads(mut self) -> Self {
        self.failing_reads = true;
        self
    }

    /// Counter of hardware accesses: requests, frees, direction changes and value reads.
    pub fn calls(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }

    fn touch(&self, offset: u32) -> DriverResult<usize> {
        self.calls.set(self.calls.get() + 1);
        let offset = offset as usize;
        if offset < self.values.len() {
            Ok(offset)
        } else {
            Err(DriverError::OffsetOutOfRange {
                offset: offset as u32,
                pin_count: self.values.len() as u32,
            })
        }
    }
}

impl GpioBank for FakeBank {
    fn bank_name(&self) -> Option<&str> {
        self.name
    }

    fn pin_count(&self) -> u32 {
        self.values.len() as u32
    }

    fn request(&mut self, offset: u32, _label: &str) -> DriverResult<Claim> {
        self.touch(offset).map(|_| Claim::Acquired)
    }

    fn free(&mut self, offset: u32) -> DriverResult<()> {
        self.touch(offset).map(|_| ())
    }

    fn direction_input(&mut self, offset: u32) -> DriverResult<()> {
        self.touch(offset).map(|_| ())
    }

    fn direction_output(&mut self, offset: u32, value: Value) -> DriverResult<()> {
        let index = self.touch(offset)?;
        self.values[index] = value;
        Ok(())
    }

    fn get_value(&self, offset: u32) -> DriverResult<Value> {
        let index = self.touch(offset)?;
        if self.failing_reads {
            return Err(DriverError::PinMuxed(offset));
        }
        Ok(self.values[index])
    }

    fn get_state(&self, offset: u32) -> Option<DriverResult<String>> {
        let state = self.state?;
        Some(self.touch(offset).and_then(|_| {
            if self.failing_reads {
                Err(DriverError::PinMuxed(offset))
            } else {
                Ok(format!("{} #{}", state, offset))
            }
        }))
    }
}
