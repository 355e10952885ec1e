//! Go-style duration strings: `20s`, `1m30s`, `1.5h`, `300ms`.

use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("invalid duration {0:?}")]
    Invalid(String),
    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),
    #[error("negative duration {0:?}")]
    Negative(String),
    #[error("duration {0:?} out of range")]
    Overflow(String),
}

fn segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([0-9]*(?:\.[0-9]*)?)(ns|us|µs|μs|ms|s|m|h)").expect("static duration regex")
    })
}

fn unit_nanos(unit: &str) -> f64 {
    match unit {
        "ns" => 1.0,
        "us" | "µs" | "μs" => 1e3,
        "ms" => 1e6,
        "s" => 1e9,
        "m" => 60e9,
        _ => 3600e9,
    }
}

/// Parse a duration using Go's `time.ParseDuration` grammar
///
/// A leading `+` is accepted; a leading `-` is rejected since negative
/// durations have no meaning here. `0` is the only unitless value accepted.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let mut rest = input.trim();
    if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    } else if rest.starts_with('-') {
        return Err(DurationError::Negative(input.to_string()));
    }

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let mut total_nanos = 0f64;
    while !rest.is_empty() {
        let caps = match segment_regex().captures(rest) {
            Some(caps) => caps,
            None if rest.chars().all(|c| c.is_ascii_digit() || c == '.') => {
                return Err(DurationError::MissingUnit(input.to_string()))
            }
            None => return Err(DurationError::Invalid(input.to_string())),
        };

        let number = &caps[1];
        if number.is_empty() || number == "." {
            return Err(DurationError::Invalid(input.to_string()));
        }
        let value: f64 = number
            .parse()
            .map_err(|_| DurationError::Invalid(input.to_string()))?;
        total_nanos += value * unit_nanos(&caps[2]);

        rest = &rest[caps[0].len()..];
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(DurationError::Overflow(input.to_string()));
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}
