// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

//! The byte arena every loaded value points into.
//!
//! A [`Handle`](super::Handle) owns exactly one [`VcdBuffer`]. Bus values on
//! the timelines are stored as [`ByteSpan`]s relative to it, so nothing
//! derived from the body can outlive the mapping.
use std::fs::File;
use std::path::Path;
use std::str;

use memmap2::{Mmap, MmapOptions};

use super::error::VcdError;

pub(super) enum VcdBuffer {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl VcdBuffer {
    pub(super) fn map(path: &Path) -> Result<VcdBuffer, VcdError> {
        let file = File::open(path).map_err(|source| VcdError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let len = file
            .metadata()
            .map_err(|source| VcdError::Open {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        // some platforms refuse to map an empty file
        if len == 0 {
            return Ok(VcdBuffer::Owned(vec![]));
        }

        // SAFETY: the mapping is read-only and private to the Handle. A
        // concurrent writer truncating the file is outside what we guard.
        let mmap = unsafe { MmapOptions::new().map(&file) }.map_err(|source| VcdError::Map {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(VcdBuffer::Mapped(mmap))
    }

    pub(super) fn as_bytes(&self) -> &[u8] {
        match self {
            VcdBuffer::Mapped(mmap) => mmap,
            VcdBuffer::Owned(bytes) => bytes,
        }
    }

    pub(super) fn len(&self) -> usize {
        self.as_bytes().len()
    }
}

/// Location of a value inside the buffer of the owning [`Handle`](super::Handle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteSpan {
    pub(super) start: usize,
    pub(super) len: usize,
}

impl ByteSpan {
    pub(super) fn new(start: usize, len: usize) -> ByteSpan {
        ByteSpan { start, len }
    }

    pub(super) fn bytes<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
        buffer
            .get(self.start..self.start + self.len)
            .unwrap_or_default()
    }

    /// Body values are plain ASCII; anything else reads as empty.
    pub(super) fn as_str<'a>(&self, buffer: &'a [u8]) -> &'a str {
        str::from_utf8(self.bytes(buffer)).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn spans_resolve_against_the_buffer() {
        let buffer = b"#0\nb1010 \"\n".to_vec();
        let span = ByteSpan::new(4, 4);
        assert_eq!(span.as_str(&buffer), "1010");
        assert_eq!(span.len(), 4);
        // out of range spans never panic
        assert_eq!(ByteSpan::new(9, 10).as_str(&buffer), "");
    }

    #[test]
    fn maps_files_and_reports_missing_ones() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"$enddefinitions $end\n#0\n").unwrap();
        let buffer = VcdBuffer::map(file.path()).unwrap();
        assert!(matches!(buffer, VcdBuffer::Mapped(_)));
        assert_eq!(buffer.as_bytes(), b"$enddefinitions $end\n#0\n");

        let empty = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(VcdBuffer::map(empty.path()).unwrap().len(), 0);

        let missing = VcdBuffer::map(Path::new("/definitely/not/here.vcd"));
        assert!(matches!(missing, Err(VcdError::Open { .. })));
    }
}
