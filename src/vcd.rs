// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.
mod buffer;
pub use buffer::ByteSpan;

mod error;
pub use error::VcdError;

mod options;
pub use options::{LoadMode, LoadOptions};

mod reader;
pub use reader::{Cursor, Line, Word};

mod types;
pub use types::{DumpOffInterval, Handle, LoadStats, Metadata, Module, ModuleIdx, PinIdx, Timescale};

mod signal;
pub use signal::{BitRange, BitView, BusChange, Pin, PinHeader, PinType, SignalKind, SimpleChange};

mod parse;
pub use parse::parse_vcd;

mod query;
pub use query::{BitRef, PinRef, SignalQuery};

mod utilities;
pub use utilities::bin_to_hex;
