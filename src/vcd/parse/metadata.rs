// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

//! `$date`, `$version` and `$timescale`.
use chrono::prelude::*;
use itertools::Itertools;

use super::super::error::VcdError;
use super::super::reader::{next_word, WordReader};
use super::super::types::{Metadata, Timescale};
use super::combinator_atoms::{digit, take_while};
use super::types::ParseResult;

/// Words up to `$end`, joined by `separator`.
fn words_until_end(word_reader: &mut WordReader, separator: &str) -> Result<String, VcdError> {
    let mut words = vec![];
    loop {
        let (word, _) = next_word!(word_reader)?;
        if word == "$end" {
            return Ok(words.into_iter().join(separator));
        }
        words.push(word);
    }
}

pub(super) fn parse_date(word_reader: &mut WordReader) -> Result<String, VcdError> {
    words_until_end(word_reader, " ")
}

pub(super) fn parse_version(word_reader: &mut WordReader) -> Result<String, VcdError> {
    words_until_end(word_reader, " ")
}

/// We might see `1ps $end` or `1 ps $end`, both are stored as `1ps`.
pub(super) fn parse_timescale(word_reader: &mut WordReader) -> Result<String, VcdError> {
    words_until_end(word_reader, "")
}

fn decode_unit(unit: &str) -> Option<Timescale> {
    match unit {
        "fs" => Some(Timescale::Fs),
        "ps" => Some(Timescale::Ps),
        "ns" => Some(Timescale::Ns),
        "us" => Some(Timescale::Us),
        "ms" => Some(Timescale::Ms),
        "s" => Some(Timescale::S),
        "" => Some(Timescale::Unit),
        _ => None,
    }
}

impl Metadata {
    /// `10ns` decodes to `(10, Timescale::Ns)`.
    pub fn timescale_parts(&self) -> Option<(u32, Timescale)> {
        let ParseResult { matched, residual } = take_while(&self.timescale, digit);
        let scalar = matched.parse::<u32>().ok()?;
        let unit = decode_unit(residual)?;
        Some((scalar, unit))
    }

    /// Decodes the usual `Mon Jan 1 12:00:00 2024` form of `$date`.
    /// Producers write all sorts of things here, so `None` is common.
    pub fn parsed_date(&self) -> Option<DateTime<Utc>> {
        ["%a %b %e %T %Y", "%b %e, %Y %T", "%Y-%m-%d %T"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(&self.date, format).ok())
            .map(|naive| Utc.from_utc_datetime(&naive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(date: &str, timescale: &str) -> Metadata {
        Metadata {
            date: date.to_string(),
            version: String::new(),
            timescale: timescale.to_string(),
        }
    }

    #[test]
    fn text_directives_join_their_words() {
        let mut reader =
            WordReader::new(b"Icarus Verilog\n  12.0 $end 1 ps $end Tue Oct 22 $end").unwrap();
        assert_eq!(parse_version(&mut reader).unwrap(), "Icarus Verilog 12.0");
        assert_eq!(parse_timescale(&mut reader).unwrap(), "1ps");
        assert_eq!(parse_date(&mut reader).unwrap(), "Tue Oct 22");
        assert!(parse_date(&mut reader).is_err());
    }

    #[test]
    fn empty_directive_is_empty_string() {
        let mut reader = WordReader::new(b"$end").unwrap();
        assert_eq!(parse_version(&mut reader).unwrap(), "");
    }

    #[test]
    fn timescale_decoding() {
        assert_eq!(metadata("", "10ns").timescale_parts(), Some((10, Timescale::Ns)));
        assert_eq!(metadata("", "1fs").timescale_parts(), Some((1, Timescale::Fs)));
        assert_eq!(metadata("", "100").timescale_parts(), Some((100, Timescale::Unit)));
        assert_eq!(metadata("", "ns").timescale_parts(), None);
        assert_eq!(metadata("", "1 furlong").timescale_parts(), None);
    }

    #[test]
    fn date_decoding() {
        let date = metadata("Sat Oct 26 22:14:13 2024", "").parsed_date().unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 10);
        assert_eq!(date.day(), 26);
        assert_eq!(date.hour(), 22);
        assert!(metadata("today", "").parsed_date().is_none());
    }
}
