// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

//! part of the vcd parser that walks the value changes of the body
//!
//! The body is never tokenized up front. A byte cursor walks a range of
//! the buffer and hands every record to a [`ChangeSink`], which is either
//! the handle's timelines directly or a per-worker accumulator.
use std::collections::HashMap;
use std::str;

use super::super::buffer::ByteSpan;
use super::super::reader::is_separator;
use super::super::signal::Pin;
use super::super::types::{DumpOffInterval, PinIdx};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DumpMarker {
    Off(u64),
    On(u64),
}

pub(super) trait ChangeSink<'b> {
    fn record(&mut self, alias: &'b [u8], timestamp: u64, value: ByteSpan);
    fn dump_marker(&mut self, marker: DumpMarker);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct ScanSummary {
    pub(super) max_timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    /// Outside of any `$` block, or inside one whose values count.
    Record,
    /// Inside `$dumpoff`, `$comment` or an unknown keyword, until `$end`.
    Discard,
}

pub(super) fn next_token(bytes: &[u8], pos: &mut usize, end: usize) -> Option<(usize, usize)> {
    while *pos < end && is_separator(bytes[*pos]) {
        *pos += 1;
    }
    if *pos >= end {
        return None;
    }
    let start = *pos;
    while *pos < end && !is_separator(bytes[*pos]) {
        *pos += 1;
    }
    Some((start, *pos))
}

/// Base 10 digits after `#`. Saturates instead of wrapping, `None` when
/// there are no digits at all.
fn parse_timestamp(digits: &[u8]) -> Option<u64> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(digits.iter().fold(0u64, |acc, digit| {
        acc.saturating_mul(10).saturating_add((digit - b'0') as u64)
    }))
}

/// Chunks are cut at the same place, a `#` right after a newline.
fn starts_line(bytes: &[u8], start: usize, tok_start: usize) -> bool {
    tok_start == start || bytes[tok_start - 1] == b'\n'
}

/// Walks `bytes[start..end]`, which must begin at a timestamp line or at
/// the start of the body.
///
/// `$dumpvars`, `$dumpall` and `$dumpon` only mark where their values
/// begin, those values are recorded like any other. A discarded block also
/// ends at the next timestamp that starts a line, so that no block spans two
/// chunks. A `#<digits>` word in the middle of a discarded line is text.
pub(super) fn scan_body<'b, S: ChangeSink<'b>>(
    bytes: &'b [u8],
    start: usize,
    end: usize,
    sink: &mut S,
) -> ScanSummary {
    let end = end.min(bytes.len());
    let mut pos = start;
    let mut timestamp = 0u64;
    let mut summary = ScanSummary::default();
    let mut block = Block::Record;

    while let Some((tok_start, tok_end)) = next_token(bytes, &mut pos, end) {
        let token = &bytes[tok_start..tok_end];
        match token[0] {
            b'#' if block == Block::Discard && !starts_line(bytes, start, tok_start) => {}
            b'#' => {
                if let Some(parsed) = parse_timestamp(&token[1..]) {
                    timestamp = parsed;
                    summary.max_timestamp = summary.max_timestamp.max(timestamp);
                    block = Block::Record;
                }
            }
            b'$' => match token {
                b"$end" => block = Block::Record,
                b"$dumpvars" | b"$dumpall" => {}
                b"$dumpon" => sink.dump_marker(DumpMarker::On(timestamp)),
                b"$dumpoff" => {
                    sink.dump_marker(DumpMarker::Off(timestamp));
                    block = Block::Discard;
                }
                _ => block = Block::Discard,
            },
            _ if block == Block::Discard => {}
            // b1010 "
            b'b' | b'B' | b'r' | b'R' => {
                let value = ByteSpan::new(tok_start + 1, tok_end - tok_start - 1);
                if let Some((alias_start, alias_end)) = next_token(bytes, &mut pos, end) {
                    sink.record(&bytes[alias_start..alias_end], timestamp, value);
                }
            }
            // 1!
            _ => {
                let value = ByteSpan::new(tok_start, 1);
                sink.record(&token[1..], timestamp, value);
            }
        }
    }

    summary
}

/// Sink that writes straight into the handle's pins.
pub(super) struct TimelineWriter<'h> {
    pins: &'h mut [Pin],
    alias_map: &'h HashMap<String, PinIdx>,
    buffer: &'h [u8],
    pub(super) markers: Vec<DumpMarker>,
    pub(super) recorded: usize,
    pub(super) unknown: usize,
}

impl<'h> TimelineWriter<'h> {
    pub(super) fn new(
        pins: &'h mut [Pin],
        alias_map: &'h HashMap<String, PinIdx>,
        buffer: &'h [u8],
    ) -> TimelineWriter<'h> {
        TimelineWriter {
            pins,
            alias_map,
            buffer,
            markers: vec![],
            recorded: 0,
            unknown: 0,
        }
    }
}

pub(super) fn lookup_alias(alias_map: &HashMap<String, PinIdx>, alias: &[u8]) -> Option<PinIdx> {
    let alias = str::from_utf8(alias).ok()?;
    alias_map.get(alias).copied()
}

impl<'b, 'h> ChangeSink<'b> for TimelineWriter<'h> {
    fn record(&mut self, alias: &'b [u8], timestamp: u64, value: ByteSpan) {
        match lookup_alias(self.alias_map, alias) {
            Some(PinIdx(idx)) => {
                if self.pins[idx].push_change(timestamp, value, self.buffer) {
                    self.recorded += 1;
                }
            }
            None => self.unknown += 1,
        }
    }

    fn dump_marker(&mut self, marker: DumpMarker) {
        self.markers.push(marker);
    }
}

/// Turns `$dumpoff`/`$dumpon` markers, in file order, into `[start, end)`
/// intervals. A repeated `$dumpoff` keeps the first start, a `$dumpon`
/// without an open interval is ignored, an interval left open closes at
/// `max_timestamp`.
pub(super) fn pair_dump_markers(markers: &[DumpMarker], max_timestamp: u64) -> Vec<DumpOffInterval> {
    let mut intervals = vec![];
    let mut open: Option<u64> = None;

    for marker in markers {
        match *marker {
            DumpMarker::Off(timestamp) => {
                open.get_or_insert(timestamp);
            }
            DumpMarker::On(timestamp) => {
                if let Some(start) = open.take() {
                    intervals.push(DumpOffInterval {
                        start,
                        end: timestamp.max(start),
                    });
                }
            }
        }
    }

    if let Some(start) = open {
        intervals.push(DumpOffInterval {
            start,
            end: max_timestamp.max(start),
        });
    }

    intervals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collect<'b> {
        records: Vec<(&'b str, u64, String)>,
        markers: Vec<DumpMarker>,
        bytes: &'b [u8],
    }

    impl<'b> ChangeSink<'b> for Collect<'b> {
        fn record(&mut self, alias: &'b [u8], timestamp: u64, value: ByteSpan) {
            self.records.push((
                str::from_utf8(alias).unwrap(),
                timestamp,
                value.as_str(self.bytes).to_string(),
            ));
        }

        fn dump_marker(&mut self, marker: DumpMarker) {
            self.markers.push(marker);
        }
    }

    fn scan(body: &[u8]) -> (Vec<(&str, u64, String)>, Vec<DumpMarker>, u64) {
        let mut sink = Collect {
            bytes: body,
            ..Default::default()
        };
        let summary = scan_body(body, 0, body.len(), &mut sink);
        (sink.records, sink.markers, summary.max_timestamp)
    }

    #[test]
    fn records_scalars_and_vectors() {
        let (records, _, max) = scan(b"#0\n0!\nb0000 \"\n#5\n1!\n#10\n0!\nB1x \"\n");
        assert_eq!(
            records,
            vec![
                ("!", 0, "0".to_string()),
                ("\"", 0, "0000".to_string()),
                ("!", 5, "1".to_string()),
                ("!", 10, "0".to_string()),
                ("\"", 10, "1x".to_string()),
            ]
        );
        assert_eq!(max, 10);
    }

    #[test]
    fn dumpvars_values_are_recorded() {
        let (records, markers, _) = scan(b"#0 $dumpvars x! bxxxx \" $end #3 1!");
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], ("\"", 0, "xxxx".to_string()));
        assert!(markers.is_empty());
    }

    #[test]
    fn dumpoff_and_comments_are_discarded() {
        let (records, markers, max) = scan(
            b"#0\n1!\n#4\n$dumpoff\nx!\nbxxxx \"\n$end\n#8\n$comment 0! b1 # $end\n$dumpon\n0!\n$end\n#9\n$unknown 1! $end\n1!\n",
        );
        assert_eq!(
            records,
            vec![
                ("!", 0, "1".to_string()),
                ("!", 8, "0".to_string()),
                ("!", 9, "1".to_string()),
            ]
        );
        assert_eq!(markers, vec![DumpMarker::Off(4), DumpMarker::On(8)]);
        assert_eq!(max, 9);
    }

    #[test]
    fn unterminated_block_stops_at_next_timestamp() {
        let (records, markers, _) = scan(b"#1\n$dumpoff\nx!\n#2\n1!\n");
        assert_eq!(records, vec![("!", 2, "1".to_string())]);
        assert_eq!(markers, vec![DumpMarker::Off(1)]);
    }

    #[test]
    fn hash_words_inside_a_comment_are_text() {
        let (records, markers, max) =
            scan(b"#0\n1!\n#10\n$comment rerun from #500 after reset $end\n0!\n#20\n1!\n");
        assert_eq!(
            records,
            vec![
                ("!", 0, "1".to_string()),
                ("!", 10, "0".to_string()),
                ("!", 20, "1".to_string()),
            ]
        );
        assert!(markers.is_empty());
        assert_eq!(max, 20);

        // a timestamp starting a line still ends an unterminated comment
        let (records, _, max) = scan(b"#0\n$comment see #7 and\n#3\n1!\n");
        assert_eq!(records, vec![("!", 3, "1".to_string())]);
        assert_eq!(max, 3);
    }

    #[test]
    fn timestamps() {
        assert_eq!(parse_timestamp(b"1234"), Some(1234));
        assert_eq!(parse_timestamp(b""), None);
        assert_eq!(parse_timestamp(b"12a"), None);
        assert_eq!(parse_timestamp(b"99999999999999999999999"), Some(u64::MAX));
    }

    #[test]
    fn scans_only_the_given_range() {
        let body = b"#0\n1!\n#7\n0!\n";
        let mut sink = Collect {
            bytes: body,
            ..Default::default()
        };
        let summary = scan_body(body, 6, body.len(), &mut sink);
        assert_eq!(sink.records, vec![("!", 7, "0".to_string())]);
        assert_eq!(summary.max_timestamp, 7);
    }

    #[test]
    fn marker_pairing() {
        use DumpMarker::*;
        assert_eq!(
            pair_dump_markers(&[Off(4), On(8), Off(12)], 20),
            vec![
                DumpOffInterval { start: 4, end: 8 },
                DumpOffInterval { start: 12, end: 20 }
            ]
        );
        assert_eq!(
            pair_dump_markers(&[On(1), Off(2), Off(3), On(5)], 5),
            vec![DumpOffInterval { start: 2, end: 5 }]
        );
        assert!(pair_dump_markers(&[], 5).is_empty());
    }
}
