// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

//! `$dumpvars` and `$dumpall` blocks that show up before
//! `$enddefinitions`. Their values become the pins' initial states.
use log::warn;

use super::super::error::VcdError;
use super::super::reader::{next_word, WordReader};
use super::super::types::{Handle, PinIdx};

fn set_initial_value(handle: &mut Handle, alias: &str, value: &str) {
    match handle.alias_map.get(alias) {
        Some(PinIdx(idx)) => handle.all_pins[*idx].set_init_state(value),
        None => warn!("initial value {value} for undeclared alias {alias}"),
    }
}

/// Called right after the opening keyword has been consumed, returns once
/// the block's `$end` has been.
pub(super) fn parse_initial_values(
    word_reader: &mut WordReader,
    handle: &mut Handle,
) -> Result<(), VcdError> {
    loop {
        let (word, _) = next_word!(word_reader)?;
        if word == "$end" {
            return Ok(());
        }

        let mut chars = word.chars();
        let kind = chars.next();
        let rest = chars.as_str();
        match kind {
            // b0101 "
            Some('b' | 'B' | 'r' | 'R') => {
                let (alias, _) = next_word!(word_reader)?;
                set_initial_value(handle, alias, rest);
            }
            // 1!
            Some(value) => {
                let value = &word[..value.len_utf8()];
                set_initial_value(handle, rest, value);
            }
            None => {}
        }
    }
}
