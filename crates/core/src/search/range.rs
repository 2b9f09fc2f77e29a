//! Parsing for free-text range fields (`prezzo`, `consegna`).
//!
//! Operators store values like `"100-500€"`, `"250€"` or `"30-60 giorni"`.
//! The first integer run is the lower bound; if a second run follows any
//! non-digit separator it is the upper bound, otherwise the range is a single
//! point. Parsing is total: malformed input yields `None`, never an error.

/// Inclusive integer interval extracted from a range field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl IntRange {
    pub fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Extract `min` and an optional `max` from free text.
///
/// Leading and trailing non-numeric text (currency symbols, unit words) is
/// tolerated, as is any non-digit run between the two numbers. Returns `None`
/// when no integer is present or the first run overflows `i64`; an
/// overflowing later run is treated like trailing garbage.
pub fn parse_range(raw: &str) -> Option<IntRange> {
    let mut runs = digit_runs(raw);
    let min = runs.next()?;
    let max = runs.next().unwrap_or(min);
    Some(IntRange { min, max })
}

fn digit_runs(raw: &str) -> impl Iterator<Item = i64> + '_ {
    raw.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .map(|run| run.parse::<i64>())
        .take_while(Result::is_ok)
        .flatten()
}
