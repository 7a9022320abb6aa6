//! `gpio status`: walks the registered banks and prints one line per pin.
use crate::device::{GpioBank, PinFunction};
use crate::registry::{BankDescriptor, Registry};
use crate::resolve::{parse_offset, ResolveError};
use crate::{GpioError, GpioResult};
use log::{trace, warn};
use std::io::{self, Write};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Header {
    Pending,
    Shown,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Separator {
    Pending,
    Clean,
}

/// Per-report rendering state, threaded through the bank loop.
///
/// The header of a named bank is printed in front of its first printed pin. A bank that printed
/// its header leaves a blank line pending, which is emitted only if a later bank prints too.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct RenderState {
    show_all: bool,
    header: Header,
    separator: Separator,
}

impl RenderState {
    fn new(show_all: bool) -> Self {
        Self {
            show_all,
            header: Header::Pending,
            separator: Separator::Clean,
        }
    }

    fn begin_bank(self) -> Self {
        Self {
            header: Header::Pending,
            ..self
        }
    }

    fn end_bank(self) -> Self {
        match self.header {
            Header::Shown => Self {
                separator: Separator::Pending,
                ..self
            },
            Header::Pending => self,
        }
    }

    fn show_header<W: Write>(self, bank_name: Option<&str>, out: &mut W) -> io::Result<Self> {
        let name = match (self.header, bank_name) {
            (Header::Pending, Some(name)) => name,
            _ => return Ok(self),
        };

        if self.separator == Separator::Pending {
            writeln!(out)?;
        }
        writeln!(out, "Bank {}:", name)?;
        Ok(Self {
            header: Header::Shown,
            separator: Separator::Clean,
            ..self
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Selection {
    Every,
    Offset(u32),
}

/// Which pins of a bank a status filter asks for, if any.
///
/// The filter must start with the bank name (case-sensitive); what follows is either nothing or
/// an offset. Unnamed banks are only shown without a filter.
fn select(bank_name: Option<&str>, filter: Option<&str>) -> Option<Selection> {
    let filter = match filter {
        Some(filter) => filter,
        None => return Some(Selection::Every),
    };
    let rest = filter.strip_prefix(bank_name?)?;
    if rest.is_empty() {
        Some(Selection::Every)
    } else {
        parse_offset(rest).map(Selection::Offset)
    }
}

/// Prints the state of the pins selected by `filter`, bank by bank.
///
/// Unless `show_all` is set, pins whose function is `unused` are left out. Banks without pins are
/// never shown. A registry that cannot enumerate banks makes this a usage error.
pub fn show_status<W: Write>(
    registry: &Registry,
    show_all: bool,
    filter: Option<&str>,
    out: &mut W,
) -> GpioResult<()> {
    let banks = registry.banks().ok_or(GpioError::Usage)?;
    let filter = filter.filter(|filter| !filter.is_empty());
    let mut state = RenderState::new(show_all);

    for (descriptor, bank) in banks {
        if descriptor.pin_count == 0 {
            continue;
        }
        state = state.begin_bank();

        match select(descriptor.name, filter) {
            Some(Selection::Every) => {
                for offset in 0..descriptor.pin_count {
                    state = show_pin(bank, &descriptor, offset, state, out)?;
                }
            }
            Some(Selection::Offset(offset)) if offset < descriptor.pin_count => {
                state = show_pin(bank, &descriptor, offset, state, out)?;
            }
            Some(Selection::Offset(_)) => {
                return Err(GpioError::Resolve(ResolveError::OffsetOutOfRange {
                    name: filter.unwrap_or_default().to_owned(),
                    bank: descriptor.name.unwrap_or_default().to_owned(),
                }));
            }
            None => {}
        }

        state = state.end_bank();
    }

    Ok(())
}

fn show_pin<W: Write>(
    bank: &dyn GpioBank,
    descriptor: &BankDescriptor<'_>,
    offset: u32,
    state: RenderState,
    out: &mut W,
) -> GpioResult<RenderState> {
    let function = PinFunction::from_code(bank.get_function(offset));
    if !state.show_all && function == PinFunction::Unused {
        trace!("skipping unused pin {:?} {}", descriptor.name, offset);
        return Ok(state);
    }

    let state = state
        .show_header(descriptor.name, out)
        .map_err(GpioError::Console)?;

    let line = match bank.get_state(offset) {
        Some(Ok(line)) => line,
        Some(Err(err)) => {
            warn!("no state for {:?} {}: {}", descriptor.name, offset, err);
            "<unknown>".to_owned()
        }
        None => match bank.get_value(offset) {
            Ok(value) => format!(
                "{}{}: {:>8} {}",
                descriptor.name.unwrap_or_default(),
                offset,
                function.label(),
                value
            ),
            Err(err) => {
                warn!("no value for {:?} {}: {}", descriptor.name, offset, err);
                "<unknown>".to_owned()
            }
        },
    };

    writeln!(out, "{}", line).map_err(GpioError::Console)?;
    Ok(state)
}
