//! Translation of user supplied pin names into `PinHandle`s.
use crate::pin_map::PadId;
use crate::registry::{Mode, PinHandle, Registry};
use log::{debug, warn};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unknown gpio '{0}'")]
    UnknownName(String),
    #[error("'{name}' is past the last pin of bank {bank}")]
    OffsetOutOfRange { name: String, bank: String },
    #[error("'{0}' is not a gpio number")]
    NotNumeric(String),
}

/// Resolves `name` against `registry`.
///
/// With a driver-model registry a name is either a global pin number, a bank name followed by an
/// offset (bank names compare case-insensitively) or the name of a pad from `PadId`.
///
/// A legacy registry only understands numbers. The leading digits of `name` are used, and a name
/// without any leading digit means pin 0, unless the registry was built with strict numeric names.
/// Legacy numbers are not range checked here; requesting a pin that does not exist fails later.
pub fn resolve(registry: &Registry, name: &str) -> Result<PinHandle, ResolveError> {
    let handle = match registry.mode() {
        Mode::Legacy => legacy_number(name, registry.strict_numeric())?,
        Mode::DriverModel => lookup_name(registry, name)?,
    };
    debug!("resolved '{}' to gpio {}", name, handle);
    Ok(handle)
}

/// Parses an offset made only of decimal digits.
pub(crate) fn parse_offset(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn legacy_number(name: &str, strict: bool) -> Result<PinHandle, ResolveError> {
    let digits = name.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        if strict {
            return Err(ResolveError::NotNumeric(name.to_owned()));
        }
        warn!("'{}' has no leading digits, using gpio 0", name);
        return Ok(PinHandle::new(0));
    }

    let number = name[..digits]
        .bytes()
        .fold(0u32, |acc, b| acc.saturating_mul(10).saturating_add(u32::from(b - b'0')));
    Ok(PinHandle::new(number))
}

fn lookup_name(registry: &Registry, name: &str) -> Result<PinHandle, ResolveError> {
    if let Some(number) = parse_offset(name) {
        if number < registry.pin_total() {
            return Ok(PinHandle::new(number));
        }
        return Err(ResolveError::UnknownName(name.to_owned()));
    }

    if let Some(handle) = by_bank_name(registry, name)? {
        return Ok(handle);
    }

    if let Some(pad) = PadId::find(name) {
        debug!("pad {} is routed to {}", pad.name(), pad.gpio_line());
        if let Some(handle) = by_bank_name(registry, pad.gpio_line())? {
            return Ok(handle);
        }
    }

    Err(ResolveError::UnknownName(name.to_owned()))
}

fn by_bank_name(registry: &Registry, name: &str) -> Result<Option<PinHandle>, ResolveError> {
    let banks = match registry.banks() {
        Some(banks) => banks,
        None => return Ok(None),
    };

    let mut out_of_range = None;
    for (descriptor, _) in banks {
        let bank_name = match descriptor.name {
            Some(bank_name) => bank_name,
            None => continue,
        };
        let prefix = match name.get(..bank_name.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(bank_name) => prefix,
            _ => continue,
        };

        if let Some(offset) = parse_offset(&name[prefix.len()..]) {
            if offset < descriptor.pin_count {
                return Ok(Some(descriptor.handle(offset)));
            }
            out_of_range.get_or_insert_with(|| ResolveError::OffsetOutOfRange {
                name: name.to_owned(),
                bank: bank_name.to_owned(),
            });
        }
    }

    match out_of_range {
        Some(err) => Err(err),
        None => Ok(None),
    }
}
