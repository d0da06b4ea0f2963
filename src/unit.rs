use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::warn;

const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// A time unit the estimate can be entered and displayed in.
/// All computation happens in hours.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Minutes,
    #[default]
    Hours,
    Days,
}

impl Unit {
    pub const ALL: [Unit; 3] = [Unit::Minutes, Unit::Hours, Unit::Days];

    pub fn name(self) -> &'static str {
        match self {
            Unit::Minutes => "minutes",
            Unit::Hours => "hours",
            Unit::Days => "days",
        }
    }

    /// Capitalized name, used for axis titles.
    pub fn title(self) -> &'static str {
        match self {
            Unit::Minutes => "Minutes",
            Unit::Hours => "Hours",
            Unit::Days => "Days",
        }
    }

    /// Parses a unit name, falling back to hours for anything unrecognized.
    ///
    /// This is the lenient path used for command-line input: an unknown name
    /// is not an error, it is read as hours and a warning is logged. Use
    /// [`FromStr`] where a typo should be rejected instead.
    pub fn from_name_or_default(name: &str) -> Unit {
        match name.parse() {
            Ok(unit) => unit,
            Err(UnknownUnit(raw)) => {
                warn!(unit = %raw, "unknown unit, treating value as hours");
                Unit::Hours
            }
        }
    }

    /// Converts a value in this unit to hours.
    pub fn to_canonical(self, value: f64) -> f64 {
        match self {
            Unit::Minutes => value / MINUTES_PER_HOUR,
            Unit::Hours => value,
            Unit::Days => value * HOURS_PER_DAY,
        }
    }

    /// Converts a value in hours to this unit.
    pub fn from_canonical(self, hours: f64) -> f64 {
        match self {
            Unit::Minutes => hours * MINUTES_PER_HOUR,
            Unit::Hours => hours,
            Unit::Days => hours / HOURS_PER_DAY,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownUnit(pub String);

impl fmt::Display for UnknownUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown unit '{}', expected minutes, hours or days", self.0)
    }
}

impl std::error::Error for UnknownUnit {}

impl FromStr for Unit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minutes" => Ok(Unit::Minutes),
            "hours" => Ok(Unit::Hours),
            "days" => Ok(Unit::Days),
            _ => Err(UnknownUnit(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn one_day_is_twenty_four_hours() {
        let hours = Unit::Days.to_canonical(1.0);
        assert_eq!(hours, 24.0);
        assert_eq!(Unit::Days.from_canonical(hours), 1.0);
    }

    #[test]
    fn minutes_divide_by_sixty() {
        assert_eq!(Unit::Minutes.to_canonical(90.0), 1.5);
        assert_eq!(Unit::Minutes.from_canonical(1.5), 90.0);
    }

    #[test]
    fn strict_parse_rejects_unknown_names() {
        assert_eq!("Days".parse::<Unit>(), Ok(Unit::Days));
        assert_eq!(" minutes ".parse::<Unit>(), Ok(Unit::Minutes));
        assert!("weeks".parse::<Unit>().is_err());
    }

    #[test]
    fn lenient_parse_falls_back_to_hours() {
        assert_eq!(Unit::from_name_or_default("weeks"), Unit::Hours);
        assert_eq!(Unit::from_name_or_default(""), Unit::Hours);
        assert_eq!(Unit::from_name_or_default("days"), Unit::Days);
    }

    proptest! {
        #[test]
        fn canonical_round_trip(value in 1e-6f64..1e9, idx in 0usize..3) {
            let unit = Unit::ALL[idx];
            let back = unit.from_canonical(unit.to_canonical(value));
            prop_assert!((back - value).abs() <= value * 1e-12);
        }
    }
}
