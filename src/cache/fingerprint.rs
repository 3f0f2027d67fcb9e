//! Filter Fingerprint Module
//!
//! Canonicalizes a combination of optional filter predicates into a cache key.
//!
//! Layout: `<namespace>` followed by one `|`-prefixed token per field, in the
//! order the fields are appended:
//! - absent field: `~`
//! - text: `<byte length>:<raw text>`, case preserved
//! - everything else: a fixed-alphabet rendering (ISO dates, enum codes, numbers)
//!
//! Length-prefixing means no text value can imitate a separator or the
//! sentinel, so two descriptors share a key only if they are field-wise equal.

use std::fmt::Write;

use chrono::NaiveDate;

/// Token used for a field that is not part of the filter.
pub const ABSENT: &str = "~";

/// Types that can be turned into a canonical cache key.
pub trait Fingerprint {
    fn fingerprint(&self) -> String;
}

// == Filter Key ==
/// Incremental builder for a filter fingerprint. O(number of fields).
#[derive(Debug, Clone)]
pub struct FilterKey {
    buf: String,
}

impl FilterKey {
    pub fn new(namespace: &str) -> Self {
        let mut buf = String::with_capacity(namespace.len() + 64);
        buf.push_str(namespace);
        Self { buf }
    }

    fn absent(mut self) -> Self {
        self.buf.push('|');
        self.buf.push_str(ABSENT);
        self
    }

    /// Free text, kept byte-for-byte (no case folding, no trimming).
    pub fn text(mut self, value: Option<&str>) -> Self {
        match value {
            Some(text) => {
                let _ = write!(self.buf, "|{}:{}", text.len(), text);
                self
            }
            None => self.absent(),
        }
    }

    pub fn date(mut self, value: Option<NaiveDate>) -> Self {
        match value {
            Some(date) => {
                let _ = write!(self.buf, "|{}", date.format("%Y-%m-%d"));
                self
            }
            None => self.absent(),
        }
    }

    /// Enum discriminant rendered by its canonical code.
    pub fn code(mut self, value: Option<&'static str>) -> Self {
        match value {
            Some(code) => {
                self.buf.push('|');
                self.buf.push_str(code);
                self
            }
            None => self.absent(),
        }
    }

    pub fn id(mut self, value: Option<u64>) -> Self {
        match value {
            Some(id) => {
                let _ = write!(self.buf, "|{}", id);
                self
            }
            None => self.absent(),
        }
    }

    /// Numbers compare by value, so `-0.0` renders like `0.0`.
    pub fn number(mut self, value: Option<f64>) -> Self {
        match value {
            Some(n) => {
                let n = if n == 0.0 { 0.0 } else { n };
                let _ = write!(self.buf, "|{:?}", n);
                self
            }
            None => self.absent(),
        }
    }

    pub fn finish(self) -> String {
        self.buf
    }
}
