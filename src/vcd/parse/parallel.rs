// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

//! Multi-worker body scan.
//!
//! The body is cut into chunks that each start on a timestamp line, every
//! chunk is scanned on its own thread into a private accumulator, and the
//! accumulators are merged in chunk order once all workers are done.
use std::collections::HashMap;
use std::thread;

use rayon::prelude::*;

use super::super::buffer::ByteSpan;
use super::super::error::VcdError;
use super::events::{scan_body, ChangeSink, DumpMarker};

const KIB: usize = 1 << 10;
const MIB: usize = 1 << 20;

/// Bodies below this are not worth a thread pool.
const SINGLE_WORKER_LIMIT: usize = 64 * KIB;
const FALLBACK_WORKERS: usize = 8;

/// Worker count for a body of `body_len` bytes. An explicit request wins.
pub(super) fn worker_count(body_len: usize, requested: Option<usize>) -> usize {
    if let Some(workers) = requested.filter(|workers| *workers > 0) {
        return workers;
    }

    match body_len {
        len if len < SINGLE_WORKER_LIMIT => 1,
        len if len < 10 * MIB => 2,
        len if len < 20 * MIB => 4,
        _ => thread::available_parallelism()
            .map(|threads| threads.get())
            .unwrap_or(FALLBACK_WORKERS),
    }
}

/// First offset at or after `from` holding a `#` that starts a line and is
/// followed by a digit, or `end` if there is none.
pub(super) fn find_timestamp_line(bytes: &[u8], from: usize, end: usize) -> usize {
    let end = end.min(bytes.len());
    // look one byte back so a split landing right on a `#` still counts
    let search_start = from.saturating_sub(1);
    if search_start >= end {
        return end;
    }

    bytes[search_start..end]
        .windows(3)
        .position(|window| window[0] == b'\n' && window[1] == b'#' && window[2].is_ascii_digit())
        .map_or(end, |pos| search_start + pos + 1)
}

/// Chunk boundaries of `bytes[start..end]` for `workers` chunks: `start`,
/// every interior boundary in increasing order, then `end`. Fewer chunks
/// come back when the body has fewer timestamp lines than workers.
pub(super) fn chunk_boundaries(bytes: &[u8], start: usize, end: usize, workers: usize) -> Vec<usize> {
    let end = end.min(bytes.len());
    let mut boundaries = vec![start];
    let len = end.saturating_sub(start);

    for worker in 1..workers {
        let split = start + len * worker / workers;
        let last = boundaries[boundaries.len() - 1];
        let boundary = find_timestamp_line(bytes, split.max(last + 1), end);
        if boundary > last && boundary < end {
            boundaries.push(boundary);
        }
    }

    if end > start {
        boundaries.push(end);
    }
    boundaries
}

/// What one worker collected from its chunk.
#[derive(Debug, Default)]
pub(super) struct ChunkAccumulator<'b> {
    pub(super) changes: HashMap<&'b [u8], Vec<(u64, ByteSpan)>>,
    pub(super) markers: Vec<DumpMarker>,
    pub(super) max_timestamp: u64,
}

impl<'b> ChangeSink<'b> for ChunkAccumulator<'b> {
    fn record(&mut self, alias: &'b [u8], timestamp: u64, value: ByteSpan) {
        self.changes.entry(alias).or_default().push((timestamp, value));
    }

    fn dump_marker(&mut self, marker: DumpMarker) {
        self.markers.push(marker);
    }
}

/// Scans every chunk on a dedicated pool of `workers` threads. The result
/// is in chunk order.
pub(super) fn scan_chunks<'b>(
    bytes: &'b [u8],
    boundaries: &[usize],
    workers: usize,
) -> Result<Vec<ChunkAccumulator<'b>>, VcdError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|idx| format!("vcd-body-{idx}"))
        .build()?;

    let accumulators: Vec<ChunkAccumulator<'b>> = pool.install(|| {
        boundaries
            .par_windows(2)
            .map(|chunk| {
                let mut accumulator = ChunkAccumulator::default();
                let summary = scan_body(bytes, chunk[0], chunk[1], &mut accumulator);
                accumulator.max_timestamp = summary.max_timestamp;
                accumulator
            })
            .collect()
    });

    Ok(accumulators)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(lines: usize) -> Vec<u8> {
        let mut body = vec![];
        for ts in 0..lines {
            body.extend_from_slice(format!("#{ts}\n{}!\nb{:04b} \"\n", ts % 2, ts % 16).as_bytes());
        }
        body
    }

    #[test]
    fn worker_thresholds() {
        assert_eq!(worker_count(100, None), 1);
        assert_eq!(worker_count(MIB, None), 2);
        assert_eq!(worker_count(15 * MIB, None), 4);
        assert!(worker_count(30 * MIB, None) >= 1);
        assert_eq!(worker_count(100, Some(6)), 6);
        assert_eq!(worker_count(100, Some(0)), 1);
    }

    #[test]
    fn boundaries_sit_on_timestamp_lines() {
        let bytes = body(500);
        for workers in 1..12 {
            let boundaries = chunk_boundaries(&bytes, 0, bytes.len(), workers);
            assert_eq!(boundaries.first(), Some(&0));
            assert_eq!(boundaries.last(), Some(&bytes.len()));
            assert!(boundaries.len() <= workers + 1);
            assert!(boundaries.windows(2).all(|pair| pair[0] < pair[1]));
            for boundary in &boundaries[1..boundaries.len() - 1] {
                assert_eq!(bytes[boundary - 1], b'\n');
                assert_eq!(bytes[*boundary], b'#');
            }
        }
    }

    #[test]
    fn few_timestamps_means_few_chunks() {
        let bytes = b"#0\n1!\n0!\n1!\n0!\n1!\n0!\n".to_vec();
        assert_eq!(chunk_boundaries(&bytes, 0, bytes.len(), 8), vec![0, bytes.len()]);
        assert_eq!(chunk_boundaries(&bytes, 4, 4, 8), vec![4]);
    }

    #[test]
    fn split_on_a_hash_counts() {
        let bytes = b"#0\n1!\n#1\n0!\n";
        assert_eq!(find_timestamp_line(bytes, 6, bytes.len()), 6);
        assert_eq!(find_timestamp_line(bytes, 7, bytes.len()), bytes.len());
        // `#` not followed by a digit is not a timestamp line
        assert_eq!(find_timestamp_line(b"x\n#a\n", 0, 5), 5);
    }

    #[test]
    fn chunks_cover_every_record_once() {
        let bytes = body(300);
        let boundaries = chunk_boundaries(&bytes, 0, bytes.len(), 4);
        let chunks = scan_chunks(&bytes, &boundaries, 4).unwrap();
        assert_eq!(chunks.len(), boundaries.len() - 1);

        let scalars: usize = chunks
            .iter()
            .map(|chunk| chunk.changes.get(&b"!"[..]).map_or(0, Vec::len))
            .sum();
        assert_eq!(scalars, 300);
        assert_eq!(chunks.iter().map(|chunk| chunk.max_timestamp).max(), Some(299));

        // chunk order is file order
        let firsts: Vec<u64> = chunks
            .iter()
            .map(|chunk| chunk.changes[&b"!"[..]][0].0)
            .collect();
        assert!(firsts.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
