//! crates/recipe_feed_core/src/times.rs
//!
//! Cook and prep times. Durations travel as ISO-8601 strings (`PT1H30M`) and
//! are held as whole milliseconds.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::CoreError;

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

static ISO_DURATION_RE: OnceLock<Regex> = OnceLock::new();

fn iso_duration_regex() -> &'static Regex {
    ISO_DURATION_RE.get_or_init(|| {
        // sign, days, time section, hours, minutes, seconds, fraction
        let pattern = r"(?i)^([-+]?)P(?:([-+]?[0-9]+)D)?(T(?:([-+]?[0-9]+)H)?(?:([-+]?[0-9]+)M)?(?:([-+]?[0-9]+)(?:[.,]([0-9]{0,3}))?S)?)?$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("duration regex failed to compile: {error}"))
    })
}

/// A non-negative duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CookingTime {
    millis: i64,
}

impl CookingTime {
    /// Returns `None` for negative input.
    pub fn from_millis(millis: i64) -> Option<Self> {
        (millis >= 0).then_some(Self { millis })
    }

    pub fn as_millis(&self) -> i64 {
        self.millis
    }
}

impl FromStr for CookingTime {
    type Err = CoreError;

    /// Accepts `PnDTnHnMn.nS` with at most millisecond precision. Days count
    /// as 24 hours.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidInput(format!("'{s}' is not an ISO-8601 duration"));
        let caps = iso_duration_regex().captures(s.trim()).ok_or_else(invalid)?;

        let time_section = caps.get(3).map(|m| m.as_str());
        if (caps.get(2).is_none() && time_section.is_none())
            || time_section.is_some_and(|t| t.len() == 1)
        {
            return Err(invalid());
        }

        let component = |index: usize, unit: i64| -> Result<i64, CoreError> {
            match caps.get(index) {
                None => Ok(0),
                Some(m) => m
                    .as_str()
                    .parse::<i64>()
                    .ok()
                    .and_then(|n| n.checked_mul(unit))
                    .ok_or_else(invalid),
            }
        };
        let mut millis = [
            component(2, MILLIS_PER_DAY)?,
            component(4, MILLIS_PER_HOUR)?,
            component(5, MILLIS_PER_MINUTE)?,
            component(6, MILLIS_PER_SECOND)?,
        ]
        .into_iter()
        .try_fold(0i64, |acc, part| acc.checked_add(part))
        .ok_or_else(invalid)?;

        if let Some(fraction) = caps.get(7) {
            let fraction: i64 = format!("{:0<3}", fraction.as_str())
                .parse()
                .map_err(|_| invalid())?;
            let negative_seconds = caps.get(6).is_some_and(|m| m.as_str().starts_with('-'));
            let signed = if negative_seconds { -fraction } else { fraction };
            millis = millis.checked_add(signed).ok_or_else(invalid)?;
        }
        if &caps[1] == "-" {
            millis = millis.checked_neg().ok_or_else(invalid)?;
        }

        Self::from_millis(millis).ok_or_else(|| {
            CoreError::InvalidInput(format!("duration '{s}' must not be negative"))
        })
    }
}

/// Written as hours, minutes and seconds (`P1D` comes back as `PT24H`).
impl fmt::Display for CookingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.millis == 0 {
            return f.write_str("PT0S");
        }
        let hours = self.millis / MILLIS_PER_HOUR;
        let minutes = self.millis % MILLIS_PER_HOUR / MILLIS_PER_MINUTE;
        let seconds = self.millis % MILLIS_PER_MINUTE / MILLIS_PER_SECOND;
        let millis = self.millis % MILLIS_PER_SECOND;

        f.write_str("PT")?;
        if hours > 0 {
            write!(f, "{hours}H")?;
        }
        if minutes > 0 {
            write!(f, "{minutes}M")?;
        }
        if seconds > 0 || millis > 0 {
            write!(f, "{seconds}")?;
            if millis > 0 {
                let fraction = format!("{millis:03}");
                write!(f, ".{}", fraction.trim_end_matches('0'))?;
            }
            f.write_str("S")?;
        }
        Ok(())
    }
}

/// The cook and prep time of a recipe; either may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecipeTimes {
    pub cook: Option<CookingTime>,
    pub prep: Option<CookingTime>,
}

impl RecipeTimes {
    /// Overlays `update` on these times. Parts missing from the update keep
    /// their current value.
    pub fn merged(self, update: RecipeTimes) -> RecipeTimes {
        RecipeTimes {
            cook: update.cook.or(self.cook),
            prep: update.prep.or(self.prep),
        }
    }

    /// Cook plus prep time with a missing part counted as zero. `None` when
    /// neither is known.
    pub fn total(&self) -> Option<CookingTime> {
        if self.cook.is_none() && self.prep.is_none() {
            return None;
        }
        let millis = |t: Option<CookingTime>| t.map_or(0, |t| t.millis);
        Some(CookingTime {
            millis: millis(self.cook).saturating_add(millis(self.prep)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn minutes(n: i64) -> CookingTime {
        CookingTime::from_millis(n * MILLIS_PER_MINUTE).unwrap()
    }

    #[rstest]
    #[case("PT30M", 30 * MILLIS_PER_MINUTE, "PT30M")]
    #[case("PT1H30M", 90 * MILLIS_PER_MINUTE, "PT1H30M")]
    #[case("P1DT2H", 26 * MILLIS_PER_HOUR, "PT26H")]
    #[case("pt1.5s", 1_500, "PT1.5S")]
    #[case("PT2M0.25S", 2 * MILLIS_PER_MINUTE + 250, "PT2M0.25S")]
    #[case("PT0S", 0, "PT0S")]
    #[case(" PT45S ", 45 * MILLIS_PER_SECOND, "PT45S")]
    fn parses_iso_durations(#[case] raw: &str, #[case] millis: i64, #[case] shown: &str) {
        let parsed: CookingTime = raw.parse().unwrap();
        assert_eq!(parsed.as_millis(), millis);
        assert_eq!(parsed.to_string(), shown);
    }

    #[rstest]
    #[case::empty("")]
    #[case::bare_period("P")]
    #[case::empty_time_section("PT")]
    #[case::prose("30 minutes")]
    #[case::weeks("P1W")]
    #[case::sub_millisecond("PT1.2345S")]
    #[case::negative_whole("-PT5M")]
    #[case::negative_part("PT-5M")]
    #[case::overflow("PT9999999999999999H")]
    fn rejects_malformed_or_negative_durations(#[case] raw: &str) {
        assert!(matches!(
            raw.parse::<CookingTime>(),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn negative_parts_may_cancel_out() {
        let parsed: CookingTime = "PT1H-30M".parse().unwrap();
        assert_eq!(parsed, minutes(30));
    }

    #[test]
    fn total_counts_a_missing_part_as_zero() {
        let only_cook = RecipeTimes {
            cook: Some(minutes(20)),
            prep: None,
        };
        assert_eq!(only_cook.total(), Some(minutes(20)));

        let both = RecipeTimes {
            cook: Some(minutes(20)),
            prep: Some(minutes(15)),
        };
        assert_eq!(both.total(), Some(minutes(35)));
        assert_eq!(RecipeTimes::default().total(), None);
    }

    #[test]
    fn merge_keeps_parts_the_update_leaves_out() {
        let current = RecipeTimes {
            cook: Some(minutes(20)),
            prep: Some(minutes(10)),
        };
        let merged = current.merged(RecipeTimes {
            cook: None,
            prep: Some(minutes(5)),
        });
        assert_eq!(merged.cook, Some(minutes(20)));
        assert_eq!(merged.prep, Some(minutes(5)));
    }
}
