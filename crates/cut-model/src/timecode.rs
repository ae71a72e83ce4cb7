//! `HH:MM:SS` timecodes with one-second resolution.
//!
//! Every time in Reelcut (source, output and real) is a whole number of
//! seconds between `00:00:00` and `99:59:59`. Text is always two-digit,
//! zero-padded fields so a value round-trips exactly through its string form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest representable time: `99:59:59`.
pub const MAX_SECS: u32 = 99 * 3600 + 59 * 60 + 59;

/// A point in time (or a duration) in whole seconds, `0..=99:59:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeValue(u32);

/// Errors produced when converting between text and seconds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimecodeError {
    #[error("time '{text}' not recognized; expected HH:MM:SS")]
    Format { text: String },

    #[error("{message}")]
    Range { message: String },
}

impl TimeValue {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(MAX_SECS);

    /// Parse strict `HH:MM:SS` text.
    ///
    /// Surrounding whitespace is ignored; everything else must be exactly
    /// three `:`-separated fields of two ASCII digits each.
    pub fn parse(text: &str) -> Result<Self, TimecodeError> {
        let trimmed = text.trim();
        let format_error = || TimecodeError::Format {
            text: text.to_string(),
        };

        let mut fields = [0u32; 3];
        let mut parts = trimmed.split(':');
        for field in fields.iter_mut() {
            let part = parts.next().ok_or_else(format_error)?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format_error());
            }
            *field = part.parse().map_err(|_| format_error())?;
        }
        if parts.next().is_some() {
            return Err(format_error());
        }

        let [hours, minutes, seconds] = fields;
        if minutes >= 60 || seconds >= 60 {
            return Err(TimecodeError::Range {
                message: format!(
                    "time '{trimmed}' is out of range; minutes and seconds must be below 60"
                ),
            });
        }

        Ok(Self(hours * 3600 + minutes * 60 + seconds))
    }

    /// Build from a signed second count.
    pub fn from_secs(secs: i64) -> Result<Self, TimecodeError> {
        if secs < 0 || secs > MAX_SECS as i64 {
            return Err(TimecodeError::Range {
                message: format!(
                    "{secs} seconds cannot be represented as HH:MM:SS (00:00:00 to 99:59:59)"
                ),
            });
        }
        Ok(Self(secs as u32))
    }

    /// Build from fractional seconds, rounding half to even.
    ///
    /// `2.5` becomes `2` and `3.5` becomes `4`.
    pub fn from_secs_f64(secs: f64) -> Result<Self, TimecodeError> {
        if !secs.is_finite() {
            return Err(TimecodeError::Range {
                message: format!("{secs} is not a finite number of seconds"),
            });
        }
        let rounded = secs.round_ties_even();
        if rounded < 0.0 || rounded > MAX_SECS as f64 {
            return Err(TimecodeError::Range {
                message: format!(
                    "{secs} seconds cannot be represented as HH:MM:SS (00:00:00 to 99:59:59)"
                ),
            });
        }
        Ok(Self(rounded as u32))
    }

    /// Whole seconds.
    pub const fn as_secs(self) -> u32 {
        self.0
    }

    /// Whole seconds, widened for signed arithmetic.
    pub const fn as_i64(self) -> i64 {
        self.0 as i64
    }

    /// Zero-padded `HH:MM:SS` text.
    pub fn format(self) -> String {
        self.to_string()
    }

    /// `(hours, minutes, seconds)` fields.
    pub const fn fields(self) -> (u32, u32, u32) {
        (self.0 / 3600, (self.0 % 3600) / 60, self.0 % 60)
    }
}

/// Format a second count as `HH:MM:SS`.
pub fn format_secs(secs: i64) -> Result<String, TimecodeError> {
    TimeValue::from_secs(secs).map(TimeValue::format)
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = self.fields();
        write!(f, "{h:02}:{m:02}:{s:02}")
    }
}

impl FromStr for TimeValue {
    type Err = TimecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TimeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(TimeValue::parse("00:00:00").unwrap().as_secs(), 0);
        assert_eq!(TimeValue::parse("01:07:06").unwrap().as_secs(), 4026);
        assert_eq!(TimeValue::parse("99:59:59").unwrap(), TimeValue::MAX);
        assert_eq!(TimeValue::parse(" 00:05:00 ").unwrap().as_secs(), 300);
    }

    #[test]
    fn test_parse_rejects_malformed_text() {
        for text in [
            "", "5:00", "0:05:00", "00:05", "00:05:00:00", "00:5:00", "aa:bb:cc", "-1:00:00",
            "00:-1:00", "000:05:00", "00:05:0x",
        ] {
            let err = TimeValue::parse(text).unwrap_err();
            assert!(
                matches!(err, TimecodeError::Format { .. }),
                "expected format error for {text:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range_fields() {
        for text in ["00:60:00", "00:00:60", "12:99:00"] {
            assert!(matches!(
                TimeValue::parse(text),
                Err(TimecodeError::Range { .. })
            ));
        }
    }

    #[test]
    fn test_format_zero_pads() {
        assert_eq!(TimeValue::from_secs(0).unwrap().to_string(), "00:00:00");
        assert_eq!(TimeValue::from_secs(3661).unwrap().to_string(), "01:01:01");
        assert_eq!(format_secs(359_999).unwrap(), "99:59:59");
    }

    #[test]
    fn test_format_rejects_out_of_range() {
        assert!(matches!(format_secs(-1), Err(TimecodeError::Range { .. })));
        assert!(matches!(
            format_secs(360_000),
            Err(TimecodeError::Range { .. })
        ));
    }

    #[test]
    fn test_fractional_seconds_round_half_to_even() {
        assert_eq!(TimeValue::from_secs_f64(0.5).unwrap().as_secs(), 0);
        assert_eq!(TimeValue::from_secs_f64(1.5).unwrap().as_secs(), 2);
        assert_eq!(TimeValue::from_secs_f64(2.5).unwrap().as_secs(), 2);
        assert_eq!(TimeValue::from_secs_f64(2.6).unwrap().as_secs(), 3);
        assert!(TimeValue::from_secs_f64(-0.6).is_err());
        assert!(TimeValue::from_secs_f64(f64::NAN).is_err());
    }

    #[test]
    fn test_serde_uses_text_form() {
        let t = TimeValue::parse("00:15:12").unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"00:15:12\"");
        let back: TimeValue = serde_json::from_str("\"00:15:12\"").unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<TimeValue>("\"15:12\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_format_then_parse_round_trips(secs in 0i64..=MAX_SECS as i64) {
            let text = format_secs(secs).unwrap();
            prop_assert_eq!(TimeValue::parse(&text).unwrap().as_i64(), secs);
        }
    }
}
