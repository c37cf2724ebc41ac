//! Cache expiration durations.
//!
//! Durations are whitespace-separated terms of a number and a unit suffix:
//! `d` (days), `h` (hours), `m` (minutes) or `s` (seconds), e.g. `"1h"` or
//! `"4d 5h"`. A bare number is seconds.

use std::time::Duration;

/// Error returned for a malformed expiration string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid expiration {input:?}: {reason}")]
pub struct ExpirationError {
    pub input: String,
    pub reason: &'static str,
}

/// Parse an expiration string into a duration.
pub fn parse_expiration(input: &str) -> Result<Duration, ExpirationError> {
    let fail = |reason| ExpirationError {
        input: input.to_string(),
        reason,
    };

    let mut total: u64 = 0;
    let mut terms = 0;
    for term in input.split_whitespace() {
        terms += 1;
        let (digits, multiplier) = match term.char_indices().last() {
            Some((i, 'd')) => (&term[..i], 86_400),
            Some((i, 'h')) => (&term[..i], 3_600),
            Some((i, 'm')) => (&term[..i], 60),
            Some((i, 's')) => (&term[..i], 1),
            _ => (term, 1),
        };
        let value: u64 = digits.parse().map_err(|_| fail("expected <number>[d|h|m|s]"))?;
        total = value
            .checked_mul(multiplier)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| fail("duration overflows"))?;
    }

    if terms == 0 {
        return Err(fail("empty duration"));
    }
    Ok(Duration::from_secs(total))
}
