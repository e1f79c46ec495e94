use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Hours before an appointment after which cancel/reschedule is disallowed,
/// unless the order carries its own override.
pub const DEFAULT_POLICY_HOURS: i32 = 24;

/// Result of evaluating the cancellation policy for one appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyDecision {
    pub can_cancel: bool,
    pub can_reschedule: bool,
    pub cancellation_deadline: DateTime<Utc>,
}

/// A missing, zero, or negative override falls back to the 24-hour default.
pub fn resolve_policy_hours(hours: Option<i32>) -> i32 {
    match hours {
        Some(h) if h > 0 => h,
        _ => DEFAULT_POLICY_HOURS,
    }
}

/// Evaluate the policy at an explicit instant.
///
/// `can_cancel` is a strict comparison: at exactly the deadline the window
/// has closed. Reschedule follows the same rule; no independent window is
/// modeled.
pub fn evaluate_at(
    start_time: DateTime<Utc>,
    policy_hours: Option<i32>,
    now: DateTime<Utc>,
) -> PolicyDecision {
    let hours = resolve_policy_hours(policy_hours);
    let cancellation_deadline = start_time - Duration::hours(hours as i64);
    let can_cancel = now < cancellation_deadline;
    PolicyDecision {
        can_cancel,
        can_reschedule: can_cancel,
        cancellation_deadline,
    }
}

/// Evaluate against the current clock. Callers gating a cancel action must
/// use this rather than a stored snapshot, because "now" advances.
pub fn evaluate(start_time: DateTime<Utc>, policy_hours: Option<i32>) -> PolicyDecision {
    evaluate_at(start_time, policy_hours, Utc::now())
}

/// A naive start time is interpreted in the system's local timezone.
pub fn resolve_start_time(naive: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        // DST fold: take the earlier wall-clock reading.
        LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        // DST gap: the wall-clock time does not exist locally; fall back
        // to reading it as UTC.
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deadline_is_start_minus_policy_hours() {
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let decision = evaluate_at(start, Some(48), now);
        assert_eq!(
            decision.cancellation_deadline,
            Utc.with_ymd_and_hms(2024, 1, 8, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_inside_window_can_cancel() {
        // start 2024-01-10T10:00Z, 24h policy, now 2024-01-09T09:00Z:
        // deadline is 2024-01-09T10:00Z, so cancellation is still open.
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 9, 9, 0, 0).unwrap();

        let decision = evaluate_at(start, Some(24), now);
        assert_eq!(
            decision.cancellation_deadline,
            Utc.with_ymd_and_hms(2024, 1, 9, 10, 0, 0).unwrap()
        );
        assert!(decision.can_cancel);
        assert!(decision.can_reschedule);
    }

    #[test]
    fn test_exactly_at_deadline_cannot_cancel() {
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 9, 10, 0, 0).unwrap();

        let decision = evaluate_at(start, Some(24), now);
        assert!(!decision.can_cancel);
        assert!(!decision.can_reschedule);
    }

    #[test]
    fn test_after_deadline_cannot_cancel() {
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 9, 10, 0, 1).unwrap();

        let decision = evaluate_at(start, Some(24), now);
        assert!(!decision.can_cancel);
    }

    #[test]
    fn test_cancel_and_reschedule_are_identical() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
        for offset_hours in [-100, -25, -24, -23, 0, 23, 24, 25, 100] {
            let now = start + Duration::hours(offset_hours);
            let decision = evaluate_at(start, Some(24), now);
            assert_eq!(decision.can_cancel, decision.can_reschedule);
        }
    }

    #[test]
    fn test_missing_or_falsy_hours_default_to_24() {
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        let expected = start - Duration::hours(24);

        for hours in [None, Some(0), Some(-5)] {
            let decision = evaluate_at(start, hours, start - Duration::days(7));
            assert_eq!(decision.cancellation_deadline, expected);
        }
        assert_eq!(resolve_policy_hours(Some(48)), 48);
        assert_eq!(resolve_policy_hours(Some(0)), 24);
        assert_eq!(resolve_policy_hours(None), 24);
    }
}
