// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

//! Reads Value Change Dump files into per-signal timelines and answers
//! "what was signal S at time T" queries against them.
mod vcd;
pub use vcd::parse_vcd;
pub use vcd::{Handle, LoadMode, LoadOptions, LoadStats, VcdError};
pub use vcd::{DumpOffInterval, Metadata, Module, ModuleIdx, PinIdx, Timescale};
pub use vcd::{BitRange, BitView, BusChange, ByteSpan, Pin, PinHeader, PinType, SignalKind, SimpleChange};
pub use vcd::{BitRef, PinRef, SignalQuery};
pub use vcd::{bin_to_hex, Cursor, Line, Word};

pub use num::BigUint;
