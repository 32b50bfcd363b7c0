// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.
use log::warn;

use super::buffer::ByteSpan;
use super::types::{ModuleIdx, PinIdx};
use super::utilities::Timestamped;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinType {
    Wire,
    Reg,
    Parameter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Simple,
    Bus,
    Parameter,
}

/// Declared `[msb:lsb]` range of a bus. Descending (`[7:0]`) and ascending
/// (`[0:7]`) ranges are both legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    pub msb: i32,
    pub lsb: i32,
}

impl BitRange {
    pub fn width(&self) -> u32 {
        self.msb.abs_diff(self.lsb) + 1
    }

    /// Declared index of bit `bit`, where bit 0 is the least significant.
    pub fn declared_index(&self, bit: u32) -> i64 {
        if self.msb >= self.lsb {
            self.lsb as i64 + bit as i64
        } else {
            self.lsb as i64 - bit as i64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleChange {
    pub timestamp: u64,
    pub(super) value: u8,
}

impl SimpleChange {
    pub fn value(&self) -> char {
        self.value as char
    }
}

/// A bus change. The bit string stays in the buffer of the owning
/// [`Handle`](super::Handle), resolve it with `Handle::span_str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusChange {
    pub timestamp: u64,
    pub value: ByteSpan,
}

impl Timestamped for SimpleChange {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl Timestamped for BusChange {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// One bit of a bus. Holds no timeline, every query is forwarded to the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitView {
    pub(super) bus: PinIdx,
    pub(super) bit: u32,
}

impl BitView {
    pub fn bus(&self) -> PinIdx {
        self.bus
    }

    /// 0 is the least significant bit.
    pub fn bit(&self) -> u32 {
        self.bit
    }
}

#[derive(Debug, Clone)]
pub struct PinHeader {
    pub(super) pin_type: PinType,
    pub(super) alias: String,
    pub(super) name: String,
    pub(super) init_state: String,
    pub(super) parent: ModuleIdx,
    pub(super) self_idx: PinIdx,
}

#[derive(Debug)]
pub enum Pin {
    Simple {
        header: PinHeader,
        timeline: Vec<SimpleChange>,
    },
    Bus {
        header: PinHeader,
        range: BitRange,
        timeline: Vec<BusChange>,
        sub_pins: Vec<BitView>,
    },
    Parameter {
        header: PinHeader,
    },
}

impl Pin {
    pub fn header(&self) -> &PinHeader {
        match self {
            Pin::Simple { header, .. } | Pin::Bus { header, .. } | Pin::Parameter { header } => {
                header
            }
        }
    }

    fn header_mut(&mut self) -> &mut PinHeader {
        match self {
            Pin::Simple { header, .. } | Pin::Bus { header, .. } | Pin::Parameter { header } => {
                header
            }
        }
    }

    pub fn kind(&self) -> SignalKind {
        match self {
            Pin::Simple { .. } => SignalKind::Simple,
            Pin::Bus { .. } => SignalKind::Bus,
            Pin::Parameter { .. } => SignalKind::Parameter,
        }
    }

    pub fn pin_type(&self) -> PinType {
        self.header().pin_type
    }

    pub fn alias(&self) -> &str {
        &self.header().alias
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    /// Value before the first change, taken from a `$dumpvars` block placed
    /// before `$enddefinitions`. For parameters this is the parameter's value.
    ///
    /// Dumps that open their body with `#0 $dumpvars ... $end` leave this
    /// empty, those values are the first entries of the timeline instead and
    /// queries see them the same way.
    pub fn init_state(&self) -> &str {
        &self.header().init_state
    }

    /// The module whose `$var` declared this pin first.
    pub fn parent(&self) -> ModuleIdx {
        self.header().parent
    }

    pub fn idx(&self) -> PinIdx {
        self.header().self_idx
    }

    pub fn range(&self) -> Option<BitRange> {
        match self {
            Pin::Bus { range, .. } => Some(*range),
            _ => None,
        }
    }

    /// 1 for simple pins, the declared range width for buses.
    pub fn width(&self) -> u32 {
        self.range().map_or(1, |range| range.width())
    }

    pub fn simple_timeline(&self) -> &[SimpleChange] {
        match self {
            Pin::Simple { timeline, .. } => timeline,
            _ => &[],
        }
    }

    pub fn bus_timeline(&self) -> &[BusChange] {
        match self {
            Pin::Bus { timeline, .. } => timeline,
            _ => &[],
        }
    }

    /// Per-bit views of a bus, index `i` is bit `i`. Empty until the body
    /// has been loaded, and always empty for other kinds of pin.
    pub fn sub_pins(&self) -> &[BitView] {
        match self {
            Pin::Bus { sub_pins, .. } => sub_pins,
            _ => &[],
        }
    }

    pub fn change_count(&self) -> usize {
        match self {
            Pin::Simple { timeline, .. } => timeline.len(),
            Pin::Bus { timeline, .. } => timeline.len(),
            Pin::Parameter { .. } => 0,
        }
    }

    /// A vector value given to a 1-bit pin keeps only its last character.
    pub(super) fn set_init_state(&mut self, state: &str) {
        let state = match self {
            Pin::Simple { .. } => state.get(state.len().saturating_sub(1)..).unwrap_or(state),
            _ => state,
        };
        self.header_mut().init_state = state.to_string();
    }

    /// Appends one body record. A vector record on a 1-bit pin keeps its
    /// least significant character, a scalar record on a bus is stored as a
    /// collapsed one character value. Parameters take the value as their
    /// constant. Returns whether the record was kept.
    pub(super) fn push_change(&mut self, timestamp: u64, value: ByteSpan, buffer: &[u8]) -> bool {
        match self {
            Pin::Simple { timeline, .. } => match value.bytes(buffer).last() {
                Some(&value) => {
                    timeline.push(SimpleChange { timestamp, value });
                    true
                }
                None => false,
            },
            Pin::Bus { timeline, .. } => {
                timeline.push(BusChange { timestamp, value });
                true
            }
            Pin::Parameter { header } => {
                header.init_state = value.as_str(buffer).to_string();
                true
            }
        }
    }

    pub(super) fn is_sorted(&self) -> bool {
        fn sorted<T: Timestamped>(timeline: &[T]) -> bool {
            timeline
                .windows(2)
                .all(|pair| pair[0].timestamp() <= pair[1].timestamp())
        }

        match self {
            Pin::Simple { timeline, .. } => sorted(timeline),
            Pin::Bus { timeline, .. } => sorted(timeline),
            Pin::Parameter { .. } => true,
        }
    }

    /// Stable, so changes sharing a timestamp keep their file order.
    pub(super) fn sort_timeline(&mut self) {
        match self {
            Pin::Simple { timeline, .. } => timeline.sort_by_key(|change| change.timestamp),
            Pin::Bus { timeline, .. } => timeline.sort_by_key(|change| change.timestamp),
            Pin::Parameter { .. } => {}
        }
    }

    pub(super) fn build_sub_pins(&mut self) {
        if let Pin::Bus {
            header,
            range,
            sub_pins,
            ..
        } = self
        {
            let bus = header.self_idx;
            *sub_pins = (0..range.width()).map(|bit| BitView { bus, bit }).collect();
        }
    }

    pub(super) fn warn_on_width_mismatch(&self, declared_size: u32) {
        if let Pin::Bus { header, range, .. } = self {
            if range.width() != declared_size {
                warn!(
                    "signal `{}` declares size {declared_size} but range [{}:{}]",
                    header.name, range.msb, range.lsb
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(alias: &str) -> PinHeader {
        PinHeader {
            pin_type: PinType::Wire,
            alias: alias.to_string(),
            name: "sig".to_string(),
            init_state: String::new(),
            parent: ModuleIdx(0),
            self_idx: PinIdx(3),
        }
    }

    #[test]
    fn ranges_in_both_directions() {
        let down = BitRange { msb: 7, lsb: 0 };
        let up = BitRange { msb: 0, lsb: 7 };
        assert_eq!(down.width(), 8);
        assert_eq!(up.width(), 8);
        assert_eq!(down.declared_index(2), 2);
        assert_eq!(up.declared_index(2), 5);
    }

    #[test]
    fn records_land_on_the_right_timeline() {
        let buffer = b"1! b0101 \" 7p".to_vec();
        let mut simple = Pin::Simple {
            header: header("!"),
            timeline: vec![],
        };
        assert!(simple.push_change(4, ByteSpan::new(0, 1), &buffer));
        // vector record on a scalar keeps the lsb
        assert!(simple.push_change(5, ByteSpan::new(4, 4), &buffer));
        // an empty bit string leaves nothing to keep
        assert!(!simple.push_change(6, ByteSpan::new(3, 0), &buffer));
        let values: Vec<_> = simple.simple_timeline().iter().map(|c| c.value()).collect();
        assert_eq!(values, vec!['1', '1']);

        let mut param = Pin::Parameter { header: header("p") };
        param.push_change(0, ByteSpan::new(11, 1), &buffer);
        assert_eq!(param.init_state(), "7");
        assert_eq!(param.change_count(), 0);
    }

    #[test]
    fn sorting_is_stable() {
        let mut bus = Pin::Bus {
            header: header("\""),
            range: BitRange { msb: 3, lsb: 0 },
            timeline: vec![],
            sub_pins: vec![],
        };
        let buffer = b"0000 0001 0010".to_vec();
        bus.push_change(10, ByteSpan::new(0, 4), &buffer);
        bus.push_change(5, ByteSpan::new(5, 4), &buffer);
        bus.push_change(5, ByteSpan::new(10, 4), &buffer);
        assert!(!bus.is_sorted());
        bus.sort_timeline();
        assert!(bus.is_sorted());
        let starts: Vec<_> = bus.bus_timeline().iter().map(|c| c.value.start).collect();
        assert_eq!(starts, vec![5, 10, 0]);
    }

    #[test]
    fn sub_pins_are_views_of_the_bus() {
        let mut bus = Pin::Bus {
            header: header("\""),
            range: BitRange { msb: 3, lsb: 0 },
            timeline: vec![],
            sub_pins: vec![],
        };
        assert!(bus.sub_pins().is_empty());
        bus.build_sub_pins();
        assert_eq!(bus.sub_pins().len(), 4);
        assert!(bus
            .sub_pins()
            .iter()
            .enumerate()
            .all(|(i, view)| view.bus() == PinIdx(3) && view.bit() == i as u32));
    }
}
