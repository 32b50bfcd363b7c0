// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.
use super::super::error::VcdError;
use super::super::reader::{next_word, WordReader};
use super::types::ParseResult;

pub(super) fn digit(chr: u8) -> bool {
    chr.is_ascii_digit()
}

pub(super) fn take_until(word: &str, pattern: u8) -> ParseResult<'_> {
    let new_start = word
        .as_bytes()
        .iter()
        .position(|chr| *chr == pattern)
        .unwrap_or(word.len());

    ParseResult {
        matched: &word[0..new_start],
        residual: &word[new_start..],
    }
}

pub(super) fn take_while(word: &str, cond: fn(u8) -> bool) -> ParseResult<'_> {
    let new_start = word
        .as_bytes()
        .iter()
        .position(|chr| !cond(*chr))
        .unwrap_or(word.len());

    ParseResult {
        matched: &word[0..new_start],
        residual: &word[new_start..],
    }
}

pub(super) fn tag<'a>(word: &'a str, pattern: &str) -> ParseResult<'a> {
    let new_start = word
        .as_bytes()
        .iter()
        .zip(pattern.as_bytes())
        .take_while(|(c_lhs, c_rhs)| c_lhs == c_rhs)
        .count();

    ParseResult {
        matched: &word[0..new_start],
        residual: &word[new_start..],
    }
}

/// Consumes the next word and fails unless it is exactly `keyword`.
pub(super) fn ident(word_reader: &mut WordReader, keyword: &'static str) -> Result<(), VcdError> {
    let (word, cursor) = next_word!(word_reader)?;

    if word == keyword {
        Ok(())
    } else {
        Err(VcdError::UnexpectedToken {
            found: word.to_string(),
            expected: keyword,
            cursor,
        })
    }
}

/// Consumes words up to and including the next `$end`.
pub(super) fn skip_until_end(word_reader: &mut WordReader) -> Result<(), VcdError> {
    loop {
        let (word, _) = next_word!(word_reader)?;
        if word == "$end" {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms_split_words() {
        let res = take_while("10ns", digit);
        assert_eq!((res.matched, res.residual), ("10", "ns"));
        let res = take_until("3:0", b':');
        assert_eq!((res.matched, res.residual), ("3", ":0"));
        let res = take_until("30", b':');
        assert_eq!((res.matched, res.residual), ("30", ""));
        let res = tag("$scope", "$");
        assert_eq!((res.matched, res.residual), ("$", "scope"));
        assert_eq!(tag("scope", "$").matched, "");
    }

    #[test]
    fn ident_reports_what_it_found() {
        let mut reader = WordReader::new(b"$end $upscope").unwrap();
        assert!(ident(&mut reader, "$end").is_ok());
        let err = ident(&mut reader, "$end").unwrap_err();
        assert!(matches!(
            err,
            VcdError::UnexpectedToken { ref found, expected: "$end", .. } if found == "$upscope"
        ));
        assert!(matches!(
            ident(&mut reader, "$end"),
            Err(VcdError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn skips_to_end() {
        let mut reader = WordReader::new(b"some words here $end $var").unwrap();
        skip_until_end(&mut reader).unwrap();
        assert_eq!(reader.next_word().map(|(w, _)| w), Some("$var"));
        assert!(skip_until_end(&mut reader).is_err());
    }
}
