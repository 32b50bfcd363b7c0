// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

/// part of the vcd parser that handles parsing the module tree and
/// registering every declared pin
use log::debug;

use super::super::error::VcdError;
use super::super::reader::{next_word, Cursor, WordReader};
use super::super::signal::{BitRange, Pin, PinHeader, PinType};
use super::super::types::{Handle, Module, ModuleIdx, PinIdx};

use super::combinator_atoms::{ident, skip_until_end, tag, take_until};
use super::types::ParseResult;

const ORPHANED_MODULE: &str = "Orphaned Signals";

/// Parses `[msb:lsb]`.
fn parse_range(word: &str, cursor: Cursor) -> Result<BitRange, VcdError> {
    let malformed = || VcdError::MalformedBitRange {
        range: word.to_string(),
        cursor,
    };

    // [7:0]
    // ^ - opening bracket
    let ParseResult { matched, residual } = tag(word, "[");
    if matched != "[" {
        return Err(malformed());
    }

    // [7:0]
    //  ^ - msb
    let ParseResult { matched, residual } = take_until(residual, b':');
    let msb = matched.trim().parse::<i32>().map_err(|_| malformed())?;

    // [7:0]
    //   ^ - colon
    let ParseResult { matched, residual } = tag(residual, ":");
    if matched != ":" {
        return Err(malformed());
    }

    // [7:0]
    //    ^^ - lsb and closing bracket
    let ParseResult { matched, residual } = take_until(residual, b']');
    let lsb = matched.trim().parse::<i32>().map_err(|_| malformed())?;
    if residual != "]" {
        return Err(malformed());
    }

    Ok(BitRange { msb, lsb })
}

/// Splits `cnt[3:0]` into `cnt` and `[3:0]`.
fn split_glued_range(name: &str) -> Option<(&str, &str)> {
    if !name.ends_with(']') {
        return None;
    }
    let open = name.rfind('[')?;
    match open {
        0 => None,
        _ => Some(name.split_at(open)),
    }
}

/// The module that collects `$var`s declared outside of any scope.
pub(super) fn orphaned_module(handle: &mut Handle) -> ModuleIdx {
    let existing = handle
        .root_modules
        .iter()
        .copied()
        .find(|idx| handle.module(*idx).name == ORPHANED_MODULE);

    match existing {
        Some(idx) => idx,
        None => {
            let idx = ModuleIdx(handle.all_modules.len());
            handle.all_modules.push(Module {
                name: ORPHANED_MODULE.to_string(),
                parent_idx: None,
                self_idx: idx,
                child_pins: vec![],
                child_modules: vec![],
            });
            handle.root_modules.push(idx);
            idx
        }
    }
}

pub(super) fn parse_var(
    word_reader: &mut WordReader,
    parent: ModuleIdx,
    handle: &mut Handle,
) -> Result<(), VcdError> {
    // $var reg 4 " cnt [3:0] $end
    //      ^^^ - pin type
    let (word, cursor) = next_word!(word_reader)?;
    let pin_type = match word {
        "wire" => PinType::Wire,
        "reg" => PinType::Reg,
        "parameter" => PinType::Parameter,
        _ => {
            return Err(VcdError::UnknownVarType {
                found: word.to_string(),
                cursor,
            })
        }
    };

    // $var reg 4 " cnt [3:0] $end
    //          ^ - size
    let (word, cursor) = next_word!(word_reader)?;
    let size = word.parse::<u32>().map_err(|_| VcdError::InvalidSize {
        found: word.to_string(),
        cursor,
    })?;

    // $var reg 4 " cnt [3:0] $end
    //            ^ - alias
    let (alias, _) = next_word!(word_reader)?;

    // $var reg 4 " cnt [3:0] $end
    //              ^^^^^^^^^ - name, then an optional range token
    let mut name_words = vec![];
    let mut range_word: Option<(&str, Cursor)> = None;
    let name_cursor = word_reader.peek_word().map_or(cursor, |(_, cursor)| cursor);
    loop {
        let (word, cursor) = next_word!(word_reader)?;
        match word {
            "$end" => break,
            other if other.starts_with('[') => range_word = Some((other, cursor)),
            other => name_words.push(other),
        }
    }
    let mut name = name_words.join(" ");

    let pin_kind = match (pin_type, size) {
        (PinType::Parameter, _) => {
            if let Some((range, _)) = range_word {
                debug!("ignoring range {range} on parameter `{name}`");
            }
            None
        }
        (_, 1) => {
            match range_word {
                // `data [3]` is a single bit select, it is part of the name
                Some((range, _)) if !range.contains(':') => name.push_str(range),
                Some((range, cursor)) => {
                    return Err(VcdError::UnexpectedBitRange {
                        name,
                        range: range.to_string(),
                        cursor,
                    })
                }
                None => {}
            }
            None
        }
        (_, size) => {
            let range = match range_word {
                Some((range, cursor)) => parse_range(range, cursor)?,
                None => match split_glued_range(&name) {
                    Some((base, range)) => {
                        let parsed = parse_range(range, name_cursor)?;
                        let base = base.to_string();
                        name = base;
                        parsed
                    }
                    None => {
                        return Err(VcdError::MissingBitRange {
                            name,
                            size,
                            cursor: name_cursor,
                        })
                    }
                },
            };
            Some(range)
        }
    };

    // Is the alias already declared, maybe from another scope? If so the
    // module just gets a reference to the pin we already have.
    let pin_idx = match handle.alias_map.get(alias) {
        Some(pin_idx) => {
            debug!("alias {alias} of `{name}` shares the pin of an earlier declaration");
            *pin_idx
        }
        None => {
            let pin_idx = PinIdx(handle.all_pins.len());
            let header = PinHeader {
                pin_type,
                alias: alias.to_string(),
                name,
                init_state: String::new(),
                parent,
                self_idx: pin_idx,
            };
            let pin = match pin_kind {
                _ if pin_type == PinType::Parameter => Pin::Parameter { header },
                Some(range) => Pin::Bus {
                    header,
                    range,
                    timeline: vec![],
                    sub_pins: vec![],
                },
                None => Pin::Simple {
                    header,
                    timeline: vec![],
                },
            };
            pin.warn_on_width_mismatch(size);

            handle.all_pins.push(pin);
            handle.alias_map.insert(alias.to_string(), pin_idx);
            pin_idx
        }
    };

    let ModuleIdx(parent) = parent;
    let module = &mut handle.all_modules[parent];
    if !module.child_pins.contains(&pin_idx) {
        module.child_pins.push(pin_idx);
    }

    Ok(())
}

/// Consumes a `begin`/`task`/`function`/`fork` scope whose kind word has
/// already been read, nested scopes included.
fn skip_scope(word_reader: &mut WordReader, kind: &str) -> Result<(), VcdError> {
    let (name, _) = next_word!(word_reader)?;
    debug!("skipping {kind} scope {name}");

    let mut depth = 1usize;
    loop {
        let (word, _) = next_word!(word_reader)?;
        match word {
            "$scope" => depth += 1,
            "$upscope" => {
                ident(word_reader, "$end")?;
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            "$comment" => skip_until_end(word_reader)?,
            _ => {}
        }
    }
}

/// Contents of a scope up to and including its `$upscope $end`. `owner` is
/// `None` for an anonymous scope at the top level.
fn parse_scope_body(
    word_reader: &mut WordReader,
    owner: Option<ModuleIdx>,
    handle: &mut Handle,
) -> Result<(), VcdError> {
    loop {
        let (word, cursor) = next_word!(word_reader)?;
        match word {
            "$scope" => parse_scope(word_reader, owner, handle)?,
            "$var" => {
                let module = match owner {
                    Some(module) => module,
                    None => orphaned_module(handle),
                };
                parse_var(word_reader, module, handle)?;
            }
            "$upscope" => {
                ident(word_reader, "$end")?;
                return Ok(());
            }
            "$comment" => skip_until_end(word_reader)?,
            _ => {
                return Err(VcdError::UnexpectedToken {
                    found: word.to_string(),
                    expected: "one of $scope, $var, $comment or $upscope",
                    cursor,
                })
            }
        }
    }
}

/// Called right after `$scope` has been consumed.
pub(super) fn parse_scope(
    word_reader: &mut WordReader,
    parent: Option<ModuleIdx>,
    handle: &mut Handle,
) -> Result<(), VcdError> {
    // $scope module top $end
    //        ^^^^^^ - scope kind
    let (kind, cursor) = next_word!(word_reader)?;
    match kind {
        "module" => {}
        "begin" | "task" | "function" | "fork" => return skip_scope(word_reader, kind),
        _ => {
            return Err(VcdError::UnknownScopeKind {
                found: kind.to_string(),
                cursor,
            })
        }
    }

    // $scope module top $end
    //               ^^^ - module name
    let (name, _) = next_word!(word_reader)?;

    // Some writers emit `$scope module $end`. Such a scope is transparent,
    // whatever it holds belongs to the enclosing module.
    if name == "$end" {
        return parse_scope_body(word_reader, parent, handle);
    }
    ident(word_reader, "$end")?;

    let module_idx = ModuleIdx(handle.all_modules.len());
    match parent {
        Some(ModuleIdx(parent)) => handle.all_modules[parent].child_modules.push(module_idx),
        None => handle.root_modules.push(module_idx),
    }
    handle.all_modules.push(Module {
        name: name.to_string(),
        parent_idx: parent,
        self_idx: module_idx,
        child_pins: vec![],
        child_modules: vec![],
    });

    parse_scope_body(word_reader, Some(module_idx), handle)
}
