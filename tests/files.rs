// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

pub const COUNTER: &str = "./tests/vcd-files/counter.vcd";
pub const ORPHANS: &str = "./tests/vcd-files/orphans.vcd";
pub const PARAMS: &str = "./tests/vcd-files/params.vcd";

pub const FILES: [&str; 3] = [COUNTER, ORPHANS, PARAMS];
