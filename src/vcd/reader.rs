// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

//! Whitespace tokenizer for the header region.
//!
//! The body is never tokenized, it is walked by the byte cursor in
//! `parse/events.rs`.
use std::collections::VecDeque;
use std::fmt;
use std::str;

use super::error::VcdError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line(pub usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word(pub usize);
/// Position of a header token, both components 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(pub Line, pub Word);

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Cursor(Line(line), Word(word)) = self;
        write!(f, "line {line}, word {word}")
    }
}

pub(super) fn is_separator(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

/// Splits `bytes` on space, tab, CR and LF. Empty tokens are dropped and
/// the encounter order is kept.
pub(super) fn tokenize<'a>(bytes: &'a [u8]) -> Result<VecDeque<(&'a str, Cursor)>, VcdError> {
    let mut words = VecDeque::new();
    let mut curr_line = 1usize;
    let mut words_in_line = 0usize;
    let mut word_start: Option<usize> = None;

    for (idx, &byte) in bytes.iter().enumerate() {
        if is_separator(byte) {
            if let Some(start) = word_start.take() {
                push_word(&mut words, &bytes[start..idx], curr_line, &mut words_in_line)?;
            }
            if byte == b'\n' {
                curr_line += 1;
                words_in_line = 0;
            }
        } else if word_start.is_none() {
            word_start = Some(idx);
        }
    }

    // the region may end without a trailing separator
    if let Some(start) = word_start {
        push_word(&mut words, &bytes[start..], curr_line, &mut words_in_line)?;
    }

    Ok(words)
}

fn push_word<'a>(
    words: &mut VecDeque<(&'a str, Cursor)>,
    word: &'a [u8],
    line: usize,
    words_in_line: &mut usize,
) -> Result<(), VcdError> {
    let word = str::from_utf8(word).map_err(|_| VcdError::NonUtf8Header { line })?;
    *words_in_line += 1;
    words.push_back((word, Cursor(Line(line), Word(*words_in_line))));
    Ok(())
}

/// FIFO over the header tokens. Every directive handler pops exactly the
/// words of its own directive.
pub(super) struct WordReader<'a> {
    words: VecDeque<(&'a str, Cursor)>,
}

impl<'a> WordReader<'a> {
    pub(super) fn new(header: &'a [u8]) -> Result<WordReader<'a>, VcdError> {
        Ok(WordReader {
            words: tokenize(header)?,
        })
    }

    pub(super) fn next_word(&mut self) -> Option<(&'a str, Cursor)> {
        self.words.pop_front()
    }

    pub(super) fn peek_word(&self) -> Option<(&'a str, Cursor)> {
        self.words.front().copied()
    }
}

macro_rules! next_word {
    ($word_reader:ident) => {
        $word_reader
            .next_word()
            .ok_or($crate::vcd::error::VcdError::UnexpectedEof {
                near: concat!(file!(), ":", line!()),
            })
    };
}

pub(crate) use next_word;

#[cfg(test)]
mod tests {
    use super::*;

    fn words(bytes: &[u8]) -> Vec<&str> {
        tokenize(bytes).unwrap().into_iter().map(|(w, _)| w).collect()
    }

    #[test]
    fn splits_on_every_separator() {
        let header = b"$date\r\n\tMon Jan  1 $end\n$timescale 1ns $end";
        assert_eq!(
            words(header),
            vec!["$date", "Mon", "Jan", "1", "$end", "$timescale", "1ns", "$end"]
        );
    }

    #[test]
    fn keeps_final_word_without_separator() {
        assert_eq!(words(b"  $enddefinitions $end"), vec!["$enddefinitions", "$end"]);
        assert!(words(b" \n\t ").is_empty());
    }

    #[test]
    fn tracks_line_and_word() {
        let tokens = tokenize(b"$scope module top $end\n  $var wire 1 ! clk $end").unwrap();
        assert_eq!(tokens[2].1, Cursor(Line(1), Word(3)));
        assert_eq!(tokens[4].1, Cursor(Line(2), Word(1)));
        assert_eq!(tokens[8].1, Cursor(Line(2), Word(5)));
    }

    #[test]
    fn rejects_non_utf8() {
        let err = tokenize(b"$date\n\xff\xfe $end").unwrap_err();
        assert!(matches!(err, VcdError::NonUtf8Header { line: 2 }));
    }

    #[test]
    fn reader_is_fifo() {
        let mut reader = WordReader::new(b"$comment hi $end").unwrap();
        assert_eq!(reader.peek_word().map(|(w, _)| w), Some("$comment"));
        assert_eq!(reader.next_word().map(|(w, _)| w), Some("$comment"));
        assert_eq!(reader.peek_word().map(|(w, _)| w), Some("hi"));
        reader.next_word();
        reader.next_word();
        assert!(reader.next_word().is_none());
        assert!(reader.peek_word().is_none());
    }
}
