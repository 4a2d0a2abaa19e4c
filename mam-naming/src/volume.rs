//! Volume notation codec
//!
//! Encodes and decodes the volume mini-grammar used in release names:
//!
//! | Shape | Meaning                         | Canonical form |
//! |-------|---------------------------------|----------------|
//! | `N`   | single volume (`1.5` = novella) | `01`, `01.5`   |
//! | `N-M` | inclusive omnibus range, N < M  | `01-03`        |
//! | `NpK` | part K of a split volume N      | `01p2`         |
//!
//! The shapes are mutually exclusive. A token carrying markers of more than one
//! shape (`1-2p3`, `1-p2`) is rejected as ambiguous rather than guessed at.
//!
//! Named positions (`prequel`, `prologue`, `omnibus`) and leading labels
//! (`Book 3`, `Vol. 2`, `#4`) are handled by [`parse_position`] before the
//! grammar runs; [`parse_volume`] itself only accepts the three shapes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Regex fragment matching one volume token in free text
pub(crate) const VOLUME_TOKEN_PATTERN: &str = r"\d+(?:\.\d)?(?:-\d+(?:\.\d)?|[pP]\d+)?";

/// Named positions, applied before grammar parsing. `None` = no volume token.
const POSITION_ALIASES: &[(&str, Option<u32>)] = &[
    ("prequel", Some(0)),
    ("prologue", Some(0)),
    ("omnibus", None),
];

static POSITION_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:book|bk\.?|vol(?:ume)?\.?|no\.?|number|#)\s*")
        .expect("position label pattern is valid")
});

/// Malformed volume notation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VolumeParseError {
    #[error("empty volume token")]
    Empty,

    #[error("malformed volume token '{0}'")]
    Malformed(String),

    #[error("volume token '{0}' matches more than one notation")]
    Ambiguous(String),

    #[error("volume range '{start}-{end}' must be strictly increasing")]
    EmptyRange { start: String, end: String },

    #[error("part number in '{0}' must be at least 1")]
    ZeroPart(String),
}

// ============================================================================
// VolumeNumber
// ============================================================================

/// Integer or integer-dot-digit volume number (`5`, `1.5`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VolumeNumber {
    whole: u32,
    tenths: Option<u8>,
}

impl VolumeNumber {
    /// Whole-number volume
    pub fn whole(whole: u32) -> Self {
        Self { whole, tenths: None }
    }

    /// Fractional volume such as `1.5`; `tenths` must be a single digit
    pub fn fractional(whole: u32, tenths: u8) -> Result<Self, VolumeParseError> {
        if tenths > 9 {
            return Err(VolumeParseError::Malformed(format!("{}.{}", whole, tenths)));
        }
        Ok(Self {
            whole,
            tenths: Some(tenths),
        })
    }

    pub fn integer_part(&self) -> u32 {
        self.whole
    }

    pub fn fraction_digit(&self) -> Option<u8> {
        self.tenths
    }

    /// Numeric comparison (`1` and `1.0` compare equal)
    fn numeric_cmp(&self, other: &Self) -> Ordering {
        (self.whole, self.tenths.unwrap_or(0)).cmp(&(other.whole, other.tenths.unwrap_or(0)))
    }

    fn parse(text: &str, token: &str) -> Result<Self, VolumeParseError> {
        let malformed = || VolumeParseError::Malformed(token.to_string());

        let (whole_text, fraction_text) = match text.split_once('.') {
            Some((w, f)) => (w, Some(f)),
            None => (text, None),
        };

        if whole_text.is_empty() || !whole_text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let whole = whole_text.parse::<u32>().map_err(|_| malformed())?;

        match fraction_text {
            None => Ok(Self::whole(whole)),
            Some(f) if f.len() == 1 && f.as_bytes()[0].is_ascii_digit() => {
                Self::fractional(whole, f.as_bytes()[0] - b'0')
            }
            Some(_) => Err(malformed()),
        }
    }

    fn write_padded(&self, out: &mut String) {
        out.push_str(&format!("{:02}", self.whole));
        if let Some(d) = self.tenths {
            out.push('.');
            out.push(char::from(b'0' + d));
        }
    }

    fn write_plain(&self, out: &mut String) {
        out.push_str(&self.whole.to_string());
        if let Some(d) = self.tenths {
            out.push('.');
            out.push(char::from(b'0' + d));
        }
    }
}

// ============================================================================
// VolumeInfo
// ============================================================================

/// Shape-specific part of a [`VolumeInfo`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeExtent {
    Single,
    Range(VolumeNumber),
    Part(u32),
}

/// Structured volume position
///
/// `base` is always present; at most one of range end / part is set, which the
/// [`VolumeExtent`] tag makes unrepresentable otherwise. Serializes as its
/// canonical string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VolumeInfo {
    base: VolumeNumber,
    extent: VolumeExtent,
}

impl VolumeInfo {
    pub fn single(base: VolumeNumber) -> Self {
        Self {
            base,
            extent: VolumeExtent::Single,
        }
    }

    /// Inclusive range; `start` must be numerically below `end`
    pub fn range(start: VolumeNumber, end: VolumeNumber) -> Result<Self, VolumeParseError> {
        if start.numeric_cmp(&end) != Ordering::Less {
            let (mut s, mut e) = (String::new(), String::new());
            start.write_plain(&mut s);
            end.write_plain(&mut e);
            return Err(VolumeParseError::EmptyRange { start: s, end: e });
        }
        Ok(Self {
            base: start,
            extent: VolumeExtent::Range(end),
        })
    }

    /// Part `part` (1-based) of volume `base`
    pub fn part(base: VolumeNumber, part: u32) -> Result<Self, VolumeParseError> {
        if part == 0 {
            let mut token = String::new();
            base.write_plain(&mut token);
            token.push_str("p0");
            return Err(VolumeParseError::ZeroPart(token));
        }
        Ok(Self {
            base,
            extent: VolumeExtent::Part(part),
        })
    }

    pub fn base(&self) -> VolumeNumber {
        self.base
    }

    pub fn extent(&self) -> VolumeExtent {
        self.extent
    }

    pub fn range_end(&self) -> Option<VolumeNumber> {
        match self.extent {
            VolumeExtent::Range(end) => Some(end),
            _ => None,
        }
    }

    pub fn part_number(&self) -> Option<u32> {
        match self.extent {
            VolumeExtent::Part(k) => Some(k),
            _ => None,
        }
    }

    /// Unpadded canonical number for upload metadata (`16`, `1.5`, `1-3`, `1p2`)
    pub fn upload_number(&self) -> String {
        let mut out = String::new();
        self.base.write_plain(&mut out);
        match self.extent {
            VolumeExtent::Single => {}
            VolumeExtent::Range(end) => {
                out.push('-');
                end.write_plain(&mut out);
            }
            VolumeExtent::Part(k) => {
                out.push('p');
                out.push_str(&k.to_string());
            }
        }
        out
    }

    /// Unpadded spellings that may appear in free text: the full token and the base alone
    pub(crate) fn plain_numbers(&self) -> Vec<String> {
        let mut numbers = vec![self.upload_number()];
        let mut base = String::new();
        self.base.write_plain(&mut base);
        if !numbers.contains(&base) {
            numbers.push(base);
        }
        numbers
    }
}

/// Parse a grammar token (`N`, `N.F`, `N-M`, `NpK`)
pub fn parse_volume(token: &str) -> Result<VolumeInfo, VolumeParseError> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(VolumeParseError::Empty);
    }

    let has_range = trimmed.contains('-');
    let has_part = trimmed.contains(['p', 'P']);

    match (has_range, has_part) {
        (true, true) => Err(VolumeParseError::Ambiguous(trimmed.to_string())),
        (true, false) => {
            let (start, end) = trimmed
                .split_once('-')
                .ok_or_else(|| VolumeParseError::Malformed(trimmed.to_string()))?;
            let start = VolumeNumber::parse(start, trimmed)?;
            let end = VolumeNumber::parse(end, trimmed)?;
            VolumeInfo::range(start, end)
        }
        (false, true) => {
            let (base, part) = trimmed
                .split_once(['p', 'P'])
                .ok_or_else(|| VolumeParseError::Malformed(trimmed.to_string()))?;
            let base = VolumeNumber::parse(base, trimmed)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VolumeParseError::Malformed(trimmed.to_string()));
            }
            let part = part
                .parse::<u32>()
                .map_err(|_| VolumeParseError::Malformed(trimmed.to_string()))?;
            VolumeInfo::part(base, part)
        }
        (false, false) => Ok(VolumeInfo::single(VolumeNumber::parse(trimmed, trimmed)?)),
    }
}

/// Canonical form: base zero-padded to two integer digits
pub fn format_volume(info: &VolumeInfo) -> String {
    let mut out = String::new();
    info.base.write_padded(&mut out);
    match info.extent {
        VolumeExtent::Single => {}
        VolumeExtent::Range(end) => {
            out.push('-');
            end.write_padded(&mut out);
        }
        VolumeExtent::Part(k) => {
            out.push('p');
            out.push_str(&k.to_string());
        }
    }
    out
}

/// Parse a free-form series position
///
/// Strips a leading label (`Book`, `Vol.`, `#`...), applies the named-position
/// alias table, then runs the grammar. `Ok(None)` means "no volume token"
/// (blank position or an alias such as `omnibus`).
pub fn parse_position(raw: &str) -> Result<Option<VolumeInfo>, VolumeParseError> {
    let trimmed = raw.trim();
    let unlabeled = POSITION_LABEL.replace(trimmed, "");
    let token = unlabeled.trim();

    if token.is_empty() {
        return Ok(None);
    }

    let lowered = token.to_lowercase();
    if let Some((_, alias)) = POSITION_ALIASES.iter().find(|(name, _)| *name == lowered) {
        return Ok(alias.map(|n| VolumeInfo::single(VolumeNumber::whole(n))));
    }

    parse_volume(token).map(Some)
}

impl fmt::Display for VolumeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_volume(self))
    }
}

impl FromStr for VolumeInfo {
    type Err = VolumeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_volume(s)
    }
}

impl TryFrom<String> for VolumeInfo {
    type Error = VolumeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_volume(&value)
    }
}

impl From<VolumeInfo> for String {
    fn from(value: VolumeInfo) -> Self {
        format_volume(&value)
    }
}
