//! Helpers shared by the iasign crates.

use std::fmt;

/// Redact hides a secret in `Debug` and `Display` output.
///
/// - Empty values print as `EMPTY`.
/// - Values shorter than 12 bytes print as `***`.
/// - Longer values keep their first and last three characters so two keys
///   can still be told apart in logs.
pub struct Redact<'a>(&'a str);

impl<'a, T: AsRef<str> + ?Sized> From<&'a T> for Redact<'a> {
    fn from(value: &'a T) -> Self {
        Redact(value.as_ref())
    }
}

impl fmt::Display for Redact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.0.len();
        if len == 0 {
            return f.write_str("EMPTY");
        }
        if len < 12 {
            return f.write_str("***");
        }

        match (self.0.get(..3), self.0.get(len - 3..)) {
            (Some(head), Some(tail)) => write!(f, "{head}***{tail}"),
            _ => f.write_str("***"),
        }
    }
}

impl fmt::Debug for Redact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
