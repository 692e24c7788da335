use std::fmt;
use std::str::FromStr;

use rdkafka::Offset;

use crate::error::ConfigError;

/// Where each selected partition starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetDirective {
    Earliest,
    Latest,
    /// Resume from the offset committed for the consumer group.
    Stored,
    Absolute(i64),
    /// N messages before the current end of the partition.
    TailRelative(i64),
}

impl OffsetDirective {
    pub fn resolve(spec: &str) -> Result<Self, ConfigError> {
        match spec {
            "end" => Ok(OffsetDirective::Latest),
            "beginning" => Ok(OffsetDirective::Earliest),
            "stored" => Ok(OffsetDirective::Stored),
            other => {
                let value = other
                    .parse::<i64>()
                    .map_err(|_| ConfigError::InvalidOffsetSpec(other.to_string()))?;
                if value >= 0 {
                    Ok(OffsetDirective::Absolute(value))
                } else {
                    // i64::MIN has no positive counterpart
                    value
                        .checked_neg()
                        .map(OffsetDirective::TailRelative)
                        .ok_or_else(|| ConfigError::InvalidOffsetSpec(other.to_string()))
                }
            }
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, OffsetDirective::Stored)
    }
}

impl FromStr for OffsetDirective {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

impl fmt::Display for OffsetDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffsetDirective::Earliest => write!(f, "beginning"),
            OffsetDirective::Latest => write!(f, "end"),
            OffsetDirective::Stored => write!(f, "stored"),
            OffsetDirective::Absolute(offset) => write!(f, "{offset}"),
            OffsetDirective::TailRelative(count) => write!(f, "-{count}"),
        }
    }
}

impl From<OffsetDirective> for Offset {
    fn from(directive: OffsetDirective) -> Self {
        match directive {
            OffsetDirective::Earliest => Offset::Beginning,
            OffsetDirective::Latest => Offset::End,
            OffsetDirective::Stored => Offset::Stored,
            OffsetDirective::Absolute(offset) => Offset::Offset(offset),
            OffsetDirective::TailRelative(count) => Offset::OffsetTail(count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_resolve_to_logical_offsets() {
        assert_eq!(
            OffsetDirective::resolve("end").unwrap(),
            OffsetDirective::Latest
        );
        assert_eq!(
            OffsetDirective::resolve("beginning").unwrap(),
            OffsetDirective::Earliest
        );
        assert_eq!(
            OffsetDirective::resolve("stored").unwrap(),
            OffsetDirective::Stored
        );
    }

    #[test]
    fn integers_resolve_to_absolute_or_tail() {
        assert_eq!(
            OffsetDirective::resolve("100").unwrap(),
            OffsetDirective::Absolute(100)
        );
        assert_eq!(
            OffsetDirective::resolve("0").unwrap(),
            OffsetDirective::Absolute(0)
        );
        assert_eq!(
            OffsetDirective::resolve("-5").unwrap(),
            OffsetDirective::TailRelative(5)
        );
    }

    #[test]
    fn garbage_is_rejected() {
        for spec in ["abc", "", "END", "12abc", "1.5"] {
            match OffsetDirective::resolve(spec) {
                Err(ConfigError::InvalidOffsetSpec(s)) => assert_eq!(s, spec),
                other => panic!("expected InvalidOffsetSpec for {spec:?}, got {other:?}"),
            }
        }
        assert!(OffsetDirective::resolve(&i64::MIN.to_string()).is_err());
    }

    #[test]
    fn parses_via_from_str_and_displays_back() {
        let directive: OffsetDirective = "-42".parse().unwrap();
        assert_eq!(directive.to_string(), "-42");
        assert_eq!(OffsetDirective::Earliest.to_string(), "beginning");
    }

    #[test]
    fn converts_into_rdkafka_offsets() {
        assert_eq!(Offset::from(OffsetDirective::Earliest), Offset::Beginning);
        assert_eq!(Offset::from(OffsetDirective::Latest), Offset::End);
        assert_eq!(Offset::from(OffsetDirective::Stored), Offset::Stored);
        assert_eq!(
            Offset::from(OffsetDirective::Absolute(7)),
            Offset::Offset(7)
        );
        assert_eq!(
            Offset::from(OffsetDirective::TailRelative(3)),
            Offset::OffsetTail(3)
        );
    }
}
