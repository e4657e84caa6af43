//! Date histogram interval classification and compatibility
//!
//! An interval is either a fixed duration (`100ms`, `5m`, `90d`) or a calendar
//! unit (`month`, `1M`, `day`, `1d`). Rollup data stored at one interval can
//! answer a query at another interval only if the query buckets are at least
//! as coarse as the stored buckets:
//!
//! - fixed vs fixed: compare millis, warn when the query is not an exact multiple
//! - calendar vs calendar: compare unit rank, always exact
//! - fixed vs calendar: compare nominal millis and warn, since calendar units
//!   have no constant length

use crate::error::RollupError;
use crate::Result;
use std::fmt;
use std::str::FromStr;

/// Calendar unit, declared in rank order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CalendarUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl CalendarUnit {
    /// Parse a calendar keyword or its magnitude-1 shorthand.
    ///
    /// Shorthands are case-sensitive: `1m` is a minute, `1M` is a month.
    pub fn parse_interval(s: &str) -> Option<Self> {
        match s {
            "second" | "1s" => Some(CalendarUnit::Second),
            "minute" | "1m" => Some(CalendarUnit::Minute),
            "hour" | "1h" => Some(CalendarUnit::Hour),
            "day" | "1d" => Some(CalendarUnit::Day),
            "week" | "1w" => Some(CalendarUnit::Week),
            "month" | "1M" => Some(CalendarUnit::Month),
            "quarter" | "1q" => Some(CalendarUnit::Quarter),
            "year" | "1y" => Some(CalendarUnit::Year),
            _ => None,
        }
    }

    /// Approximate length, only meaningful for cross-kind comparison
    pub const fn nominal_millis(&self) -> u64 {
        match self {
            CalendarUnit::Second => 1_000,
            CalendarUnit::Minute => 60_000,
            CalendarUnit::Hour => 3_600_000,
            CalendarUnit::Day => 86_400_000,
            CalendarUnit::Week => 604_800_000,
            CalendarUnit::Month => 2_592_000_000,
            CalendarUnit::Quarter => 7_776_000_000,
            CalendarUnit::Year => 31_536_000_000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarUnit::Second => "second",
            CalendarUnit::Minute => "minute",
            CalendarUnit::Hour => "hour",
            CalendarUnit::Day => "day",
            CalendarUnit::Week => "week",
            CalendarUnit::Month => "month",
            CalendarUnit::Quarter => "quarter",
            CalendarUnit::Year => "year",
        }
    }
}

/// A date histogram interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    /// Exact duration in milliseconds, always > 0
    Fixed(u64),
    Calendar(CalendarUnit),
}

/// Fixed-interval units and their length in millis
const FIXED_UNITS: [(&str, u64); 5] = [
    ("ms", 1),
    ("s", 1_000),
    ("m", 60_000),
    ("h", 3_600_000),
    ("d", 86_400_000),
];

impl Interval {
    /// Classify an interval expression.
    ///
    /// Calendar keywords and shorthands win over the fixed pattern, so `1d`
    /// is a calendar day while `2d` is a fixed 172800000ms.
    pub fn classify(text: &str) -> Result<Self> {
        if let Some(unit) = CalendarUnit::parse_interval(text) {
            return Ok(Interval::Calendar(unit));
        }
        Self::classify_fixed(text)
    }

    /// Parse only the fixed `<integer><unit>` form, so `1d` is 86400000ms.
    pub fn classify_fixed(text: &str) -> Result<Self> {
        let malformed = || RollupError::MalformedInterval(text.to_string());

        let split = text
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(malformed)?;
        let (digits, unit) = text.split_at(split);
        if digits.is_empty() {
            return Err(malformed());
        }

        let magnitude: u64 = digits.parse().map_err(|_| malformed())?;
        let unit_millis = FIXED_UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, millis)| *millis)
            .ok_or_else(malformed)?;

        let millis = magnitude.checked_mul(unit_millis).ok_or_else(malformed)?;
        Self::fixed(millis).map_err(|_| malformed())
    }

    /// Fixed interval from a raw millisecond count
    pub fn fixed(millis: u64) -> Result<Self> {
        if millis == 0 {
            return Err(RollupError::MalformedInterval("0ms".to_string()));
        }
        Ok(Interval::Fixed(millis))
    }

    pub fn is_calendar(&self) -> bool {
        matches!(self, Interval::Calendar(_))
    }

    /// Exact millis for fixed intervals, nominal millis for calendar units
    pub fn nominal_millis(&self) -> u64 {
        match self {
            Interval::Fixed(millis) => *millis,
            Interval::Calendar(unit) => unit.nominal_millis(),
        }
    }
}

impl FromStr for Interval {
    type Err = RollupError;

    fn from_str(s: &str) -> Result<Self> {
        Self::classify(s)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Fixed(millis) => write!(f, "{}ms", millis),
            Interval::Calendar(unit) => f.write_str(unit.as_str()),
        }
    }
}

/// Outcome of a millisecond comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compatibility {
    /// Query buckets are at least as coarse as the stored buckets
    pub ok: bool,
    /// Query length is an exact multiple of the stored length
    pub exact: bool,
}

/// Compare a fixed query interval against a fixed config interval
pub fn fixed_compatible(query_millis: u64, config_millis: u64) -> Compatibility {
    if config_millis == 0 {
        return Compatibility {
            ok: false,
            exact: false,
        };
    }
    let ok = query_millis >= config_millis;
    Compatibility {
        ok,
        exact: ok && query_millis % config_millis == 0,
    }
}

/// Coarser-or-equal calendar requests are always derivable from finer calendar data
pub fn calendar_compatible(query: CalendarUnit, config: CalendarUnit) -> bool {
    query >= config
}

/// Compare intervals of different kinds through their nominal millis.
///
/// Callers must surface [`CompatibilityWarning::MixedIntervalTypes`] for any
/// match accepted through this path.
pub fn mixed_compatible(query: Interval, config: Interval) -> Compatibility {
    fixed_compatible(query.nominal_millis(), config.nominal_millis())
}

/// Warning attached to a match that is accepted today but may be rejected later
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompatibilityWarning {
    /// Query interval is coarser than the config interval but not a multiple of it
    NotMultiple,
    /// Query and config intervals are of different kinds (fixed vs calendar)
    MixedIntervalTypes,
}

impl CompatibilityWarning {
    pub fn message(&self) -> &'static str {
        match self {
            CompatibilityWarning::NotMultiple => {
                "query intervals must be a multiple of configured intervals"
            }
            CompatibilityWarning::MixedIntervalTypes => {
                "query and config interval types must match (e.g. fixed-time config can only be \
                 queried with fixed-time aggregations, and calendar-time config can only be \
                 queried with calendar-time aggregations)"
            }
        }
    }
}

impl fmt::Display for CompatibilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of checking one query interval against one job's interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalMatch {
    NoMatch,
    Match { warnings: Vec<CompatibilityWarning> },
}

impl IntervalMatch {
    pub fn exact() -> Self {
        IntervalMatch::Match { warnings: vec![] }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, IntervalMatch::Match { .. })
    }

    pub fn warnings(&self) -> &[CompatibilityWarning] {
        match self {
            IntervalMatch::NoMatch => &[],
            IntervalMatch::Match { warnings } => warnings,
        }
    }

    pub(crate) fn from_compatibility(compat: Compatibility, mixed: bool) -> Self {
        if !compat.ok {
            return IntervalMatch::NoMatch;
        }
        let mut warnings = Vec::new();
        if mixed {
            warnings.push(CompatibilityWarning::MixedIntervalTypes);
        }
        if !compat.exact {
            warnings.push(CompatibilityWarning::NotMultiple);
        }
        IntervalMatch::Match { warnings }
    }
}

/// Check a date histogram query interval against a job's configured interval.
///
/// Same-kind comparison is used when both sides are fixed or both calendar;
/// otherwise the nominal (mixed) comparison applies.
pub fn check_date_interval(query: Interval, config: Interval) -> IntervalMatch {
    match (query, config) {
        (Interval::Calendar(q), Interval::Calendar(c)) => {
            if calendar_compatible(q, c) {
                IntervalMatch::exact()
            } else {
                IntervalMatch::NoMatch
            }
        }
        (Interval::Fixed(q), Interval::Fixed(c)) => {
            IntervalMatch::from_compatibility(fixed_compatible(q, c), false)
        }
        _ => IntervalMatch::from_compatibility(mixed_compatible(query, config), true),
    }
}
