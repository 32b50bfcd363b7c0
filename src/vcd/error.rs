// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

//! Errors produced while opening a dump and loading its header or body.
//!
//! Only load entry points return these. Queries against a loaded
//! [`Handle`](super::Handle) never fail, they fall back to default values.

use std::io;
use std::path::PathBuf;

use super::reader::Cursor;

#[derive(Debug, thiserror::Error)]
pub enum VcdError {
    /// The file could not be opened or its metadata could not be read.
    #[error("failed to open `{}`: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file was opened but could not be memory mapped.
    #[error("failed to map `{}`: {source}", path.display())]
    Map {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The header ran out of tokens in the middle of a directive.
    #[error("Error near {near}. Reached the end of the header while a directive was still open.")]
    UnexpectedEof { near: &'static str },

    #[error("found `{found}` but expected {expected} on {cursor}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        cursor: Cursor,
    },

    #[error("unknown $var type `{found}` on {cursor}, expected one of wire, reg or parameter")]
    UnknownVarType { found: String, cursor: Cursor },

    #[error("unknown $scope kind `{found}` on {cursor}")]
    UnknownScopeKind { found: String, cursor: Cursor },

    #[error("failed to parse `{found}` as a signal size on {cursor}")]
    InvalidSize { found: String, cursor: Cursor },

    #[error("signal `{name}` of size {size} is missing its [msb:lsb] range on {cursor}")]
    MissingBitRange {
        name: String,
        size: u32,
        cursor: Cursor,
    },

    #[error("1-bit signal `{name}` must not carry the range `{range}` on {cursor}")]
    UnexpectedBitRange {
        name: String,
        range: String,
        cursor: Cursor,
    },

    #[error("malformed bit range `{range}` on {cursor}")]
    MalformedBitRange { range: String, cursor: Cursor },

    #[error("header contains bytes that are not valid UTF-8 on line {line}")]
    NonUtf8Header { line: usize },

    #[error("no `$enddefinitions $end` found in the file")]
    MissingEndDefinitions,

    #[error("the header must be loaded before the body")]
    HeaderNotLoaded,

    #[error("the header has already been loaded")]
    HeaderAlreadyLoaded,

    #[error("the body has already been loaded")]
    BodyAlreadyLoaded,

    #[error("failed to start body scanning workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod tests {
    use super::super::reader::{Line, Word};
    use super::*;

    #[test]
    fn grammar_errors_carry_their_position() {
        let e = VcdError::UnknownVarType {
            found: "integer".into(),
            cursor: Cursor(Line(4), Word(2)),
        };
        assert_eq!(
            e.to_string(),
            "unknown $var type `integer` on line 4, word 2, expected one of wire, reg or parameter"
        );
    }

    #[test]
    fn io_errors_name_the_file() {
        let e = VcdError::Open {
            path: PathBuf::from("missing.vcd"),
            source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
        };
        assert_eq!(e.to_string(), "failed to open `missing.vcd`: file not found");
    }

    #[test]
    fn eof_errors_point_at_the_parser_site() {
        let e = VcdError::UnexpectedEof {
            near: "src/vcd/parse/scopes.rs:10",
        };
        assert!(e.to_string().starts_with("Error near src/vcd/parse/scopes.rs:10."));
    }
}
