// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.
use std::mem;
use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;

use super::buffer::VcdBuffer;
use super::error::VcdError;
use super::options::{LoadMode, LoadOptions};
use super::reader::WordReader;
use super::signal::Pin;
use super::types::{Handle, LoadState, LoadStats, Metadata, PinIdx};

mod combinator_atoms;
use combinator_atoms::{ident, skip_until_end};

mod types;

mod metadata;
use metadata::{parse_date, parse_timescale, parse_version};

mod scopes;
use scopes::{orphaned_module, parse_scope, parse_var};

mod dumpvars;
use dumpvars::parse_initial_values;

mod events;
use events::{lookup_alias, next_token, pair_dump_markers, scan_body, DumpMarker, TimelineWriter};

mod parallel;
use parallel::{chunk_boundaries, scan_chunks, worker_count};

/// Offset just past the next `$end` token.
fn skip_past_end(bytes: &[u8], pos: &mut usize) -> Option<usize> {
    while let Some((start, end)) = next_token(bytes, pos, bytes.len()) {
        if &bytes[start..end] == b"$end" {
            return Some(end);
        }
    }
    None
}

/// Byte offset right after the `$end` that closes `$enddefinitions`.
/// Text blocks are stepped over so a keyword quoted inside a comment does
/// not end the header.
pub(super) fn find_body_offset(bytes: &[u8]) -> Result<usize, VcdError> {
    let mut pos = 0;
    while let Some((start, end)) = next_token(bytes, &mut pos, bytes.len()) {
        match &bytes[start..end] {
            b"$comment" | b"$date" | b"$version" => {
                skip_past_end(bytes, &mut pos).ok_or(VcdError::MissingEndDefinitions)?;
            }
            b"$enddefinitions" => {
                return skip_past_end(bytes, &mut pos).ok_or(VcdError::MissingEndDefinitions);
            }
            _ => {}
        }
    }
    Err(VcdError::MissingEndDefinitions)
}

fn parse_header(header: &[u8], handle: &mut Handle) -> Result<(), VcdError> {
    let mut word_reader = WordReader::new(header)?;
    let word_reader = &mut word_reader;

    while let Some((word, cursor)) = word_reader.next_word() {
        match word {
            "$date" => handle.metadata.date = parse_date(word_reader)?,
            "$version" => handle.metadata.version = parse_version(word_reader)?,
            "$timescale" => handle.metadata.timescale = parse_timescale(word_reader)?,
            "$scope" => parse_scope(word_reader, None, handle)?,
            // variables declared before any scope
            "$var" => {
                let module = orphaned_module(handle);
                parse_var(word_reader, module, handle)?;
            }
            "$dumpvars" | "$dumpall" => parse_initial_values(word_reader, handle)?,
            "$enddefinitions" => {
                ident(word_reader, "$end")?;
                return Ok(());
            }
            "$upscope" => {
                return Err(VcdError::UnexpectedToken {
                    found: word.to_string(),
                    expected: "a header directive",
                    cursor,
                })
            }
            other if other.starts_with('$') => {
                debug!("skipping {other} block on {cursor}");
                skip_until_end(word_reader)?;
            }
            _ => {
                return Err(VcdError::UnexpectedToken {
                    found: word.to_string(),
                    expected: "a header directive",
                    cursor,
                })
            }
        }
    }

    Err(VcdError::MissingEndDefinitions)
}

impl Handle {
    /// Maps `path`. Nothing is parsed yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Handle, VcdError> {
        Ok(Handle::with_buffer(VcdBuffer::map(path.as_ref())?))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Handle {
        Handle::with_buffer(VcdBuffer::Owned(bytes))
    }

    /// Builds the module tree, the pins and the alias index. On error the
    /// handle is left without any declarations.
    pub fn load_header(&mut self) -> Result<(), VcdError> {
        if self.state != LoadState::Opened {
            return Err(VcdError::HeaderAlreadyLoaded);
        }
        let start = Instant::now();

        let body_offset = find_body_offset(self.buffer.as_bytes())?;

        // the tokens borrow the buffer while the tree is built into self
        let buffer = mem::replace(&mut self.buffer, VcdBuffer::Owned(vec![]));
        let result = parse_header(&buffer.as_bytes()[..body_offset], self);
        self.buffer = buffer;

        if let Err(err) = result {
            self.clear_declarations();
            return Err(err);
        }

        self.body_offset = body_offset;
        self.state = LoadState::HeaderLoaded;
        info!(
            "parsed header: {} modules, {} pins in {:?}",
            self.all_modules.len(),
            self.all_pins.len(),
            start.elapsed()
        );
        Ok(())
    }

    /// Single pass over the body.
    pub fn load_body(&mut self) -> Result<(), VcdError> {
        self.check_body_loadable()?;
        let start = Instant::now();

        let Handle {
            all_pins,
            alias_map,
            buffer,
            body_offset,
            ..
        } = self;
        let bytes = buffer.as_bytes();
        let mut writer = TimelineWriter::new(all_pins, alias_map, bytes);
        let summary = scan_body(bytes, *body_offset, bytes.len(), &mut writer);
        let recorded_changes = writer.recorded;
        let unknown_alias_records = writer.unknown;
        let markers = writer.markers;

        let unsorted = self.all_pins.iter().filter(|pin| !pin.is_sorted()).count();
        if unsorted > 0 {
            warn!("{unsorted} timelines go back in time, sorting them");
            self.all_pins
                .iter_mut()
                .filter(|pin| !pin.is_sorted())
                .for_each(Pin::sort_timeline);
        }

        self.finalize_body(
            summary.max_timestamp,
            &markers,
            LoadStats {
                workers: 1,
                recorded_changes,
                unknown_alias_records,
                elapsed: start.elapsed(),
            },
        );
        Ok(())
    }

    /// Splits the body over a worker count picked from its size.
    pub fn load_body_parallel(&mut self) -> Result<(), VcdError> {
        self.load_body_in_chunks(None)
    }

    /// Splits the body over at most `workers` workers.
    pub fn load_body_with_workers(&mut self, workers: usize) -> Result<(), VcdError> {
        self.load_body_in_chunks(Some(workers))
    }

    /// Loads whatever has not been loaded yet.
    pub fn load(&mut self, options: LoadOptions) -> Result<(), VcdError> {
        if self.state == LoadState::Opened {
            self.load_header()?;
        }
        match options.mode {
            LoadMode::Sequential => self.load_body(),
            LoadMode::Parallel => self.load_body_in_chunks(options.workers),
        }
    }

    fn load_body_in_chunks(&mut self, requested: Option<usize>) -> Result<(), VcdError> {
        self.check_body_loadable()?;
        let start = Instant::now();

        let bytes = self.buffer.as_bytes();
        let body_start = self.body_offset.min(bytes.len());
        let requested_workers = worker_count(bytes.len() - body_start, requested);
        let boundaries = chunk_boundaries(bytes, body_start, bytes.len(), requested_workers);
        // one thread per chunk, a short body may hold fewer chunks than asked for
        let workers = requested_workers.min(boundaries.len().saturating_sub(1)).max(1);
        debug!(
            "scanning {} bytes of body in {} chunks",
            bytes.len() - body_start,
            boundaries.len().saturating_sub(1)
        );
        let chunks = scan_chunks(bytes, &boundaries, workers)?;

        // merge in chunk order, so every timeline keeps file order
        let mut max_timestamp = 0;
        let mut markers: Vec<DumpMarker> = vec![];
        let mut recorded_changes = 0;
        let mut unknown_alias_records = 0;
        for chunk in chunks {
            max_timestamp = max_timestamp.max(chunk.max_timestamp);
            markers.extend(chunk.markers);
            for (alias, changes) in chunk.changes {
                match lookup_alias(&self.alias_map, alias) {
                    Some(PinIdx(idx)) => {
                        let pin = &mut self.all_pins[idx];
                        for (timestamp, value) in changes {
                            if pin.push_change(timestamp, value, bytes) {
                                recorded_changes += 1;
                            }
                        }
                    }
                    None => unknown_alias_records += changes.len(),
                }
            }
        }

        self.all_pins.par_iter_mut().for_each(Pin::sort_timeline);

        self.finalize_body(
            max_timestamp,
            &markers,
            LoadStats {
                workers,
                recorded_changes,
                unknown_alias_records,
                elapsed: start.elapsed(),
            },
        );
        Ok(())
    }

    fn check_body_loadable(&self) -> Result<(), VcdError> {
        match self.state {
            LoadState::Opened => Err(VcdError::HeaderNotLoaded),
            LoadState::HeaderLoaded => Ok(()),
            LoadState::BodyLoaded => Err(VcdError::BodyAlreadyLoaded),
        }
    }

    fn finalize_body(&mut self, max_timestamp: u64, markers: &[DumpMarker], stats: LoadStats) {
        self.all_pins.iter_mut().for_each(Pin::build_sub_pins);
        self.dumpoff_intervals = pair_dump_markers(markers, max_timestamp);
        self.max_timestamp = max_timestamp;

        if stats.unknown_alias_records > 0 {
            warn!(
                "{} value changes name aliases that were never declared",
                stats.unknown_alias_records
            );
        }
        info!(
            "loaded {} value changes with {} worker(s) in {:?}, last timestamp {}",
            stats.recorded_changes, stats.workers, stats.elapsed, max_timestamp
        );

        self.stats = stats;
        self.state = LoadState::BodyLoaded;
    }

    fn clear_declarations(&mut self) {
        self.metadata = Metadata::default();
        self.all_modules.clear();
        self.root_modules.clear();
        self.all_pins.clear();
        self.alias_map.clear();
    }
}

/// Opens `path` and loads both header and body.
pub fn parse_vcd(path: impl AsRef<Path>, options: LoadOptions) -> Result<Handle, VcdError> {
    let mut handle = Handle::open(path)?;
    handle.load(options)?;
    Ok(handle)
}
