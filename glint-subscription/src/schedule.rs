use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How often a subscription generates visits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Weekly,
    Biweekly,
    EveryFourWeeks,
}

impl Frequency {
    pub fn interval(&self) -> Duration {
        match self {
            Frequency::Weekly => Duration::weeks(1),
            Frequency::Biweekly => Duration::weeks(2),
            Frequency::EveryFourWeeks => Duration::weeks(4),
        }
    }
}

/// Generate the next `count` visit instants after `from`, spaced by the
/// subscription's frequency. The first generated visit is one interval
/// after `from`.
pub fn upcoming_visits(from: DateTime<Utc>, frequency: Frequency, count: usize) -> Vec<DateTime<Utc>> {
    let interval = frequency.interval();
    (1..=count as i64).map(|n| from + interval * n as i32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_weekly_visits() {
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        let visits = upcoming_visits(start, Frequency::Weekly, 3);

        assert_eq!(
            visits,
            vec![
                Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 6, 17, 9, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 6, 24, 9, 0, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn test_biweekly_spacing() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 14, 0, 0).unwrap();
        let visits = upcoming_visits(start, Frequency::Biweekly, 2);
        assert_eq!(visits[0] - start, Duration::weeks(2));
        assert_eq!(visits[1] - visits[0], Duration::weeks(2));
    }

    #[test]
    fn test_zero_count() {
        assert!(upcoming_visits(Utc::now(), Frequency::Weekly, 0).is_empty());
    }
}
