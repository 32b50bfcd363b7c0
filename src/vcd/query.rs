// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

//! Point queries against loaded timelines.
//!
//! Nothing in here fails: unknown aliases, out of range bits and times
//! before the first change all resolve to a default value.
use std::borrow::Cow;

use num::BigUint;

use super::buffer::ByteSpan;
use super::signal::{BitView, BusChange, Pin, SimpleChange};
use super::types::{Handle, PinIdx};
use super::utilities::{
    bin_to_hex, bit_from_bus_str, bits_to_biguint, ordered_binary_lookup, LookupErrors,
};

/// Level reported by a 1-bit signal with nothing better to go on.
const DEFAULT_LEVEL: char = '0';

/// Query surface shared by whole pins and single bits of a bus.
pub trait SignalQuery {
    /// Single character value at `timestamp`.
    fn value_at(&self, timestamp: u64) -> char;

    /// Full value at `timestamp`: the bit string of a bus, a one character
    /// string for a 1-bit signal, the constant of a parameter.
    fn bus_at(&self, timestamp: u64) -> Cow<'_, str>;
}

fn first_char_or_default(state: &str) -> char {
    state.chars().next().unwrap_or(DEFAULT_LEVEL)
}

fn char_as_str(chr: char) -> Cow<'static, str> {
    match chr {
        '0' => Cow::Borrowed("0"),
        '1' => Cow::Borrowed("1"),
        'x' => Cow::Borrowed("x"),
        'z' => Cow::Borrowed("z"),
        other => Cow::Owned(other.to_string()),
    }
}

pub(super) fn simple_value_at(timeline: &[SimpleChange], init_state: &str, timestamp: u64) -> char {
    match ordered_binary_lookup(timeline, timestamp) {
        Ok(idx) => timeline[idx].value(),
        Err(LookupErrors::PreTimeline { .. }) | Err(LookupErrors::EmptyTimeline) => {
            first_char_or_default(init_state)
        }
    }
}

pub(super) fn bus_value_at<'a>(
    timeline: &[BusChange],
    init_state: &'a str,
    timestamp: u64,
    buffer: &'a [u8],
) -> &'a str {
    match ordered_binary_lookup(timeline, timestamp) {
        Ok(idx) => timeline[idx].value.as_str(buffer),
        Err(LookupErrors::PreTimeline { .. }) | Err(LookupErrors::EmptyTimeline) => init_state,
    }
}

/// A pin together with the handle whose buffer its values live in.
#[derive(Clone, Copy)]
pub struct PinRef<'a> {
    handle: &'a Handle,
    pin: &'a Pin,
}

impl<'a> PinRef<'a> {
    pub fn pin(&self) -> &'a Pin {
        self.pin
    }

    /// Bit string of a bus, borrowed from the handle's buffer.
    pub fn bus_str_at(&self, timestamp: u64) -> &'a str {
        match self.pin {
            Pin::Bus {
                header, timeline, ..
            } => bus_value_at(timeline, &header.init_state, timestamp, self.handle.bytes()),
            Pin::Parameter { header } => &header.init_state,
            Pin::Simple { .. } => "",
        }
    }

    /// Bit `bit` of this pin, 0 being the least significant. Bits outside
    /// the declared width read as `'0'`.
    pub fn bit_at(&self, timestamp: u64, bit: u32) -> char {
        match self.pin {
            Pin::Simple { .. } if bit == 0 => self.value_at(timestamp),
            Pin::Simple { .. } => DEFAULT_LEVEL,
            Pin::Bus { range, .. } if bit < range.width() => {
                bit_from_bus_str(self.bus_str_at(timestamp), bit).unwrap_or(DEFAULT_LEVEL)
            }
            Pin::Bus { .. } => DEFAULT_LEVEL,
            Pin::Parameter { header } => {
                bit_from_bus_str(&header.init_state, bit).unwrap_or(DEFAULT_LEVEL)
            }
        }
    }

    pub fn bits(&self) -> impl Iterator<Item = BitRef<'a>> + 'a {
        let handle = self.handle;
        let pin = self.pin;
        pin.sub_pins()
            .iter()
            .map(move |view| BitRef { handle, bus: pin, view: *view })
    }
}

impl SignalQuery for PinRef<'_> {
    fn value_at(&self, timestamp: u64) -> char {
        match self.pin {
            Pin::Simple {
                header, timeline, ..
            } => simple_value_at(timeline, &header.init_state, timestamp),
            Pin::Bus { .. } => self.bit_at(timestamp, 0),
            Pin::Parameter { header } => first_char_or_default(&header.init_state),
        }
    }

    fn bus_at(&self, timestamp: u64) -> Cow<'_, str> {
        match self.pin {
            Pin::Simple { .. } => char_as_str(self.value_at(timestamp)),
            Pin::Bus { .. } | Pin::Parameter { .. } => Cow::Borrowed(self.bus_str_at(timestamp)),
        }
    }
}

/// One bit of a bus. Every query goes to the parent bus with the bit index
/// baked in; the bit shares the bus's initial state.
#[derive(Clone, Copy)]
pub struct BitRef<'a> {
    handle: &'a Handle,
    bus: &'a Pin,
    view: BitView,
}

impl<'a> BitRef<'a> {
    pub fn view(&self) -> BitView {
        self.view
    }

    pub fn bus(&self) -> &'a Pin {
        self.bus
    }

    /// Name of the bit as declared, e.g. `cnt[2]`.
    pub fn name(&self) -> String {
        match self.bus.range() {
            Some(range) => format!("{}[{}]", self.bus.name(), range.declared_index(self.view.bit)),
            None => self.bus.name().to_string(),
        }
    }

    /// The parent bus's initial state, see [`Pin::init_state`].
    pub fn init_state(&self) -> &'a str {
        self.bus.init_state()
    }
}

impl SignalQuery for BitRef<'_> {
    fn value_at(&self, timestamp: u64) -> char {
        PinRef {
            handle: self.handle,
            pin: self.bus,
        }
        .bit_at(timestamp, self.view.bit)
    }

    fn bus_at(&self, timestamp: u64) -> Cow<'_, str> {
        char_as_str(self.value_at(timestamp))
    }
}

impl Handle {
    pub fn pin_ref(&self, idx: PinIdx) -> PinRef<'_> {
        PinRef {
            handle: self,
            pin: self.pin(idx),
        }
    }

    pub fn pin_ref_by_alias(&self, alias: &str) -> Option<PinRef<'_>> {
        self.pin_by_alias(alias).map(|pin| PinRef { handle: self, pin })
    }

    /// `None` when the view's bus is not a bus of this handle.
    pub fn bit_ref(&self, view: BitView) -> Option<BitRef<'_>> {
        let PinIdx(idx) = view.bus;
        match self.all_pins.get(idx) {
            Some(bus @ Pin::Bus { range, .. }) if view.bit < range.width() => Some(BitRef {
                handle: self,
                bus,
                view,
            }),
            _ => None,
        }
    }

    /// Resolves a bus value span against this handle's buffer.
    pub fn span_str(&self, span: ByteSpan) -> &str {
        span.as_str(self.bytes())
    }

    /// Character value of `alias` at `timestamp`, `'0'` for unknown aliases.
    pub fn value_at(&self, timestamp: u64, alias: &str) -> char {
        self.pin_ref_by_alias(alias)
            .map_or(DEFAULT_LEVEL, |pin| pin.value_at(timestamp))
    }

    /// Full value of `alias` at `timestamp`, empty for unknown aliases.
    pub fn bus_at(&self, timestamp: u64, alias: &str) -> Cow<'_, str> {
        match self.pin_ref_by_alias(alias) {
            Some(PinRef { pin, .. }) if matches!(pin, Pin::Simple { .. }) => {
                char_as_str(self.value_at(timestamp, alias))
            }
            Some(pin) => Cow::Borrowed(pin.bus_str_at(timestamp)),
            None => Cow::Borrowed(""),
        }
    }

    pub fn bit_at(&self, timestamp: u64, alias: &str, bit: u32) -> char {
        self.pin_ref_by_alias(alias)
            .map_or(DEFAULT_LEVEL, |pin| pin.bit_at(timestamp, bit))
    }

    /// Value of `alias` at `timestamp` rendered as hex, empty for unknown
    /// aliases.
    pub fn bus_hex_at(&self, timestamp: u64, alias: &str) -> String {
        bin_to_hex(&self.bus_at(timestamp, alias))
    }

    /// Numeric value, `None` for unknown aliases or values holding `x`/`z`.
    pub fn bus_biguint_at(&self, timestamp: u64, alias: &str) -> Option<BigUint> {
        bits_to_biguint(&self.bus_at(timestamp, alias))
    }
}
