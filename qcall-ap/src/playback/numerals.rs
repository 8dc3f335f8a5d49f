//! Ticket number parsing and number-to-speech decomposition
//!
//! Only 1-199 have recordings. Ten and the exact tens use dedicated
//! "irregular" clips (`10a`, `20a` ... `90a`); the teens are composed from
//! `10` plus the ones clip.

use crate::error::NumeralError;
use crate::playback::segment::SegmentId;

/// Highest number with a spoken form.
pub const MAX_SPOKEN_NUMBER: u32 = 199;

/// Numeric part of a ticket id such as `"K-034"`.
///
/// The number is the field between the first and second `-`, so `"K-034-B"`
/// is 34. Falls back to parsing the whole string when there is no `-`
/// separator or that field is not a number. Anything unparseable yields 0.
pub fn extract_number(queue_number: &str) -> u32 {
    let trimmed = queue_number.trim();

    if let Some(digits) = trimmed.split('-').nth(1) {
        if let Some(n) = parse_digits(digits) {
            return n;
        }
    }

    parse_digits(trimmed).unwrap_or(0)
}

/// Leading zeros stripped; an all-zero string is 0.
fn parse_digits(digits: &str) -> Option<u32> {
    let digits = digits.trim();
    if digits.is_empty() {
        return None;
    }
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Some(0);
    }
    significant.parse().ok()
}

/// Ordered clips that speak `n`.
///
/// # Errors
/// [`NumeralError::UnsupportedNumber`] for 0 and anything above 199.
pub fn decompose(n: u32) -> Result<Vec<SegmentId>, NumeralError> {
    if n == 0 || n > MAX_SPOKEN_NUMBER {
        return Err(NumeralError::UnsupportedNumber(n));
    }
    let mut segments = Vec::with_capacity(3);
    push_segments(n, &mut segments);
    Ok(segments)
}

fn push_segments(n: u32, out: &mut Vec<SegmentId>) {
    match n {
        0 => {}
        1..=9 => out.push(SegmentId::number(n)),
        10 => out.push(SegmentId::irregular(10)),
        11..=19 => {
            out.push(SegmentId::number(10));
            out.push(SegmentId::number(n - 10));
        }
        20..=99 => {
            let (tens, ones) = (n / 10 * 10, n % 10);
            out.push(SegmentId::irregular(tens));
            if ones != 0 {
                out.push(SegmentId::number(ones));
            }
        }
        100 => out.push(SegmentId::number(100)),
        _ => {
            out.push(SegmentId::number(100));
            push_segments(n - 100, out);
        }
    }
}
