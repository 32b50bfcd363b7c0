// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.
use num::BigUint;

pub(super) trait Timestamped {
    fn timestamp(&self) -> u64;
}

#[derive(Debug, PartialEq, Eq)]
pub(super) enum LookupErrors {
    PreTimeline {
        desired_time: u64,
        timeline_start_time: u64,
    },
    EmptyTimeline,
}

/// Index of the rightmost change with `timestamp <= desired_time`.
///
/// Changes sharing a timestamp are kept in file order, so returning the
/// rightmost one makes the last write at a timestamp the authoritative one.
pub(super) fn ordered_binary_lookup<T: Timestamped>(
    timeline: &[T],
    desired_time: u64,
) -> Result<usize, LookupErrors> {
    // timeline must not be empty
    let (first, last) = match (timeline.first(), timeline.last()) {
        (Some(first), Some(last)) => (first.timestamp(), last.timestamp()),
        _ => return Err(LookupErrors::EmptyTimeline),
    };

    // check if we're requesting a value that occurs before the recorded
    // start of the timeline
    if desired_time < first {
        return Err(LookupErrors::PreTimeline {
            desired_time,
            timeline_start_time: first,
        });
    }

    // anything at or beyond the end of the timeline holds the last value
    if desired_time >= last {
        return Ok(timeline.len() - 1);
    }

    // Invariant: timeline[lower_idx] <= desired_time < timeline[upper_idx].
    // Performance is log2(n), where n is the number of events on the timeline.
    let mut lower_idx = 0usize;
    let mut upper_idx = timeline.len() - 1;
    while upper_idx - lower_idx > 1 {
        let mid_idx = lower_idx + ((upper_idx - lower_idx) / 2);
        if timeline[mid_idx].timestamp() <= desired_time {
            lower_idx = mid_idx;
        } else {
            upper_idx = mid_idx;
        }
    }

    Ok(lower_idx)
}

/// Character of bit `bit` (0 is the least significant) in a VCD bit string.
///
/// Strings shorter than the bus are left-extended the way VCD writers
/// reduce them: with the leading `x`/`z`, or with `0` otherwise.
pub(super) fn bit_from_bus_str(bus: &str, bit: u32) -> Option<char> {
    let bytes = bus.as_bytes();
    let leading = *bytes.first()?;
    let bit = bit as usize;

    if bit < bytes.len() {
        return Some(bytes[bytes.len() - 1 - bit] as char);
    }

    match leading {
        b'x' | b'X' | b'z' | b'Z' => Some(leading as char),
        _ => Some('0'),
    }
}

/// Renders a VCD bit string as upper case hex, leading zeros stripped.
/// A nibble holding an `x` renders as `X`, one holding a `z` as `Z`.
pub fn bin_to_hex(bits: &str) -> String {
    let bytes = bits.as_bytes();
    if bytes.is_empty() {
        return String::new();
    }

    // pad on the left to a whole number of nibbles, extending x/z like
    // a reduced vcd value would be
    let pad = match bytes[0] {
        b'x' | b'X' => b'x',
        b'z' | b'Z' => b'z',
        _ => b'0',
    };
    let padding = (4 - bytes.len() % 4) % 4;
    let padded: Vec<u8> = std::iter::repeat(pad)
        .take(padding)
        .chain(bytes.iter().copied())
        .collect();

    let mut hex = String::with_capacity(padded.len() / 4);
    for nibble in padded.chunks(4) {
        let mut val = 0u32;
        let mut unknown = None;
        for chr in nibble {
            val <<= 1;
            match chr {
                b'1' => val |= 1,
                b'0' => {}
                b'z' | b'Z' => {
                    if unknown.is_none() {
                        unknown = Some('Z')
                    }
                }
                // x wins over z inside one nibble
                _ => unknown = Some('X'),
            }
        }
        match unknown {
            Some(chr) => hex.push(chr),
            None => hex.push(char::from_digit(val, 16).unwrap_or('0').to_ascii_uppercase()),
        }
    }

    let trimmed = hex.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Numeric value of a bit string, `None` as soon as it holds anything other
/// than `0` and `1`.
pub(super) fn bits_to_biguint(bits: &str) -> Option<BigUint> {
    if bits.is_empty() {
        return None;
    }
    BigUint::parse_bytes(bits.as_bytes(), 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct At(u64);
    impl Timestamped for At {
        fn timestamp(&self) -> u64 {
            self.0
        }
    }

    fn timeline(times: &[u64]) -> Vec<At> {
        times.iter().map(|t| At(*t)).collect()
    }

    #[test]
    fn lookup_finds_rightmost_not_after() {
        let tl = timeline(&[10, 20, 30]);
        assert_eq!(
            ordered_binary_lookup(&tl, 5),
            Err(LookupErrors::PreTimeline {
                desired_time: 5,
                timeline_start_time: 10
            })
        );
        assert_eq!(ordered_binary_lookup(&tl, 10), Ok(0));
        assert_eq!(ordered_binary_lookup(&tl, 25), Ok(1));
        assert_eq!(ordered_binary_lookup(&tl, 30), Ok(2));
        assert_eq!(ordered_binary_lookup(&tl, 1000), Ok(2));
        assert_eq!(
            ordered_binary_lookup(&timeline(&[]), 3),
            Err(LookupErrors::EmptyTimeline)
        );
    }

    #[test]
    fn lookup_prefers_last_duplicate() {
        let tl = timeline(&[0, 5, 5, 5, 9, 9, 12]);
        assert_eq!(ordered_binary_lookup(&tl, 5), Ok(3));
        assert_eq!(ordered_binary_lookup(&tl, 7), Ok(3));
        assert_eq!(ordered_binary_lookup(&tl, 9), Ok(5));
        assert_eq!(ordered_binary_lookup(&tl, 0), Ok(0));
    }

    #[test]
    fn lookup_agrees_with_a_linear_scan() {
        let times: Vec<u64> = (0..200u64).map(|i| (i * 7) / 3).collect();
        let tl = timeline(&times);
        for desired in 0..480 {
            let expected = times.iter().rposition(|t| *t <= desired).unwrap();
            assert_eq!(ordered_binary_lookup(&tl, desired), Ok(expected));
        }
    }

    #[test]
    fn bits_index_from_the_lsb() {
        assert_eq!(bit_from_bus_str("10110000", 0), Some('0'));
        assert_eq!(bit_from_bus_str("10110000", 4), Some('1'));
        assert_eq!(bit_from_bus_str("10110000", 7), Some('1'));
        // collapsed and reduced values
        assert_eq!(bit_from_bus_str("x", 5), Some('x'));
        assert_eq!(bit_from_bus_str("z", 0), Some('z'));
        assert_eq!(bit_from_bus_str("z01", 6), Some('z'));
        assert_eq!(bit_from_bus_str("101", 6), Some('0'));
        assert_eq!(bit_from_bus_str("", 0), None);
    }

    #[test]
    fn hex_rendering() {
        assert_eq!(bin_to_hex("10110000"), "B0");
        assert_eq!(bin_to_hex("00000001"), "1");
        assert_eq!(bin_to_hex("0000"), "0");
        assert_eq!(bin_to_hex("101"), "5");
        assert_eq!(bin_to_hex("1x0000000"), "1X0");
        assert_eq!(bin_to_hex("zzzzx000"), "ZX");
        assert_eq!(bin_to_hex("00zx"), "X");
        assert_eq!(bin_to_hex("z"), "Z");
        assert_eq!(bin_to_hex(""), "");
    }

    #[test]
    fn numeric_values() {
        assert_eq!(bits_to_biguint("1010"), Some(BigUint::from(10u32)));
        assert_eq!(
            bits_to_biguint(&"1".repeat(70)),
            Some((BigUint::from(1u32) << 70usize) - 1u32)
        );
        assert_eq!(bits_to_biguint("10x1"), None);
        assert_eq!(bits_to_biguint(""), None);
    }
}
