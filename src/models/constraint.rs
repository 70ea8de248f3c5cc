//! Per-task date constraints.
//!
//! A constraint bounds a task's window independently of its dependencies.
//! The date travels inside the variant, so a constraint type without a
//! constraint date cannot be represented.
//!
//! # Semantics
//!
//! | Constraint | Effect on the driving start |
//! |------------|-----------------------------|
//! | `StartNoEarlierThan` | raised to at least the date |
//! | `FinishNoEarlierThan` | raised so the finish is at least the date |
//! | `StartNoLaterThan` | capped; exceeding the cap is flagged |
//! | `FinishNoLaterThan` | capped on the finish; exceeding is flagged |
//! | `MustStartOn` / `MustFinishOn` | replaced outright; flagged if earlier than driving |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::window::{add_days, DateWindow};
use super::ViolationKind;

/// A date constraint attached to a task.
///
/// Serialized as `{"constraint_type": "...", "constraint_date": "YYYY-MM-DD"}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    tag = "constraint_type",
    content = "constraint_date",
    rename_all = "snake_case"
)]
pub enum DateConstraint {
    /// As soon as possible.
    #[default]
    None,
    StartNoEarlierThan(NaiveDate),
    StartNoLaterThan(NaiveDate),
    FinishNoEarlierThan(NaiveDate),
    FinishNoLaterThan(NaiveDate),
    MustStartOn(NaiveDate),
    MustFinishOn(NaiveDate),
}

/// Outcome of applying a constraint to a driving start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Window the task should occupy.
    pub window: DateWindow,
    /// Set when the constraint and the predecessors disagree.
    pub conflict: Option<ViolationKind>,
}

impl Resolution {
    fn ok(window: DateWindow) -> Self {
        Self {
            window,
            conflict: None,
        }
    }

    fn conflict(window: DateWindow, kind: ViolationKind) -> Self {
        Self {
            window,
            conflict: Some(kind),
        }
    }
}

impl DateConstraint {
    /// Snake-case name used on the wire and in messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::StartNoEarlierThan(_) => "start_no_earlier_than",
            Self::StartNoLaterThan(_) => "start_no_later_than",
            Self::FinishNoEarlierThan(_) => "finish_no_earlier_than",
            Self::FinishNoLaterThan(_) => "finish_no_later_than",
            Self::MustStartOn(_) => "must_start_on",
            Self::MustFinishOn(_) => "must_finish_on",
        }
    }

    /// The constraint date, if any.
    pub fn date(&self) -> Option<NaiveDate> {
        match *self {
            Self::None => None,
            Self::StartNoEarlierThan(d)
            | Self::StartNoLaterThan(d)
            | Self::FinishNoEarlierThan(d)
            | Self::FinishNoLaterThan(d)
            | Self::MustStartOn(d)
            | Self::MustFinishOn(d) => Some(d),
        }
    }

    /// Whether the constraint pins the task to a fixed date.
    pub fn is_hard(&self) -> bool {
        matches!(self, Self::MustStartOn(_) | Self::MustFinishOn(_))
    }

    /// Whether any constraint is active.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Applies this constraint to the start date implied by predecessors.
    ///
    /// `*_no_later_than` caps clamp the window to the cap and report
    /// [`ViolationKind::ConstraintViolated`]; `must_*` overrides that land
    /// earlier than the driving date report [`ViolationKind::PredecessorConflict`].
    /// `None` when the resulting window falls outside the calendar range.
    pub fn resolve(&self, driving_start: NaiveDate, duration_days: i64) -> Option<Resolution> {
        let asap = || DateWindow::from_start(driving_start, duration_days);
        let resolution = match *self {
            Self::None => Resolution::ok(asap()?),
            Self::StartNoEarlierThan(d) => {
                Resolution::ok(DateWindow::from_start(driving_start.max(d), duration_days)?)
            }
            Self::FinishNoEarlierThan(d) => {
                let floor = add_days(d, 1i64.checked_sub(duration_days)?)?;
                Resolution::ok(DateWindow::from_start(driving_start.max(floor), duration_days)?)
            }
            Self::StartNoLaterThan(d) => {
                if driving_start > d {
                    Resolution::conflict(
                        DateWindow::from_start(d, duration_days)?,
                        ViolationKind::ConstraintViolated,
                    )
                } else {
                    Resolution::ok(asap()?)
                }
            }
            Self::FinishNoLaterThan(d) => {
                let window = asap()?;
                if window.end > d {
                    Resolution::conflict(
                        DateWindow::from_finish(d, duration_days)?,
                        ViolationKind::ConstraintViolated,
                    )
                } else {
                    Resolution::ok(window)
                }
            }
            Self::MustStartOn(d) => {
                let pinned = DateWindow::from_start(d, duration_days)?;
                if d < driving_start {
                    Resolution::conflict(pinned, ViolationKind::PredecessorConflict)
                } else {
                    Resolution::ok(pinned)
                }
            }
            Self::MustFinishOn(d) => {
                let pinned = DateWindow::from_finish(d, duration_days)?;
                if pinned.start < driving_start {
                    Resolution::conflict(pinned, ViolationKind::PredecessorConflict)
                } else {
                    Resolution::ok(pinned)
                }
            }
        };
        Some(resolution)
    }

    /// Whether an explicitly placed window satisfies the constraint.
    pub fn is_satisfied_by(&self, window: &DateWindow) -> bool {
        match *self {
            Self::None => true,
            Self::StartNoEarlierThan(d) => window.start >= d,
            Self::StartNoLaterThan(d) => window.start <= d,
            Self::FinishNoEarlierThan(d) => window.end >= d,
            Self::FinishNoLaterThan(d) => window.end <= d,
            Self::MustStartOn(d) => window.start == d,
            Self::MustFinishOn(d) => window.end == d,
        }
    }

    /// Latest finish the constraint allows, used by the backward pass.
    ///
    /// `None` when the constraint sets no limit, including a limit past the
    /// end of the calendar.
    pub fn latest_finish(&self, duration_days: i64) -> Option<NaiveDate> {
        match *self {
            Self::StartNoLaterThan(d) | Self::MustStartOn(d) => {
                add_days(d, duration_days.checked_sub(1)?)
            }
            Self::FinishNoLaterThan(d) | Self::MustFinishOn(d) => Some(d),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_none_is_asap() {
        let r = DateConstraint::None.resolve(d(2024, 1, 4), 2).unwrap();
        assert_eq!(r.window, DateWindow::new(d(2024, 1, 4), d(2024, 1, 5)));
        assert!(r.conflict.is_none());
    }

    #[test]
    fn test_no_earlier_than_raises() {
        let snet = DateConstraint::StartNoEarlierThan(d(2024, 1, 10));
        assert_eq!(snet.resolve(d(2024, 1, 4), 2).unwrap().window.start, d(2024, 1, 10));
        assert_eq!(snet.resolve(d(2024, 1, 12), 2).unwrap().window.start, d(2024, 1, 12));

        let fnet = DateConstraint::FinishNoEarlierThan(d(2024, 1, 10));
        let r = fnet.resolve(d(2024, 1, 4), 3).unwrap();
        assert_eq!(r.window.end, d(2024, 1, 10));
        assert!(r.conflict.is_none());
    }

    #[test]
    fn test_start_no_later_than_clamps_and_flags() {
        let c = DateConstraint::StartNoLaterThan(d(2024, 1, 2));
        let r = c.resolve(d(2024, 1, 4), 2).unwrap();
        assert_eq!(r.window, DateWindow::new(d(2024, 1, 2), d(2024, 1, 3)));
        assert_eq!(r.conflict, Some(ViolationKind::ConstraintViolated));

        let ok = c.resolve(d(2024, 1, 1), 2).unwrap();
        assert_eq!(ok.window.start, d(2024, 1, 1));
        assert!(ok.conflict.is_none());
    }

    #[test]
    fn test_finish_no_later_than_clamps_on_finish() {
        let c = DateConstraint::FinishNoLaterThan(d(2024, 1, 5));
        let r = c.resolve(d(2024, 1, 5), 3).unwrap();
        assert_eq!(r.window, DateWindow::new(d(2024, 1, 3), d(2024, 1, 5)));
        assert_eq!(r.conflict, Some(ViolationKind::ConstraintViolated));
    }

    #[test]
    fn test_must_start_on_overrides() {
        let c = DateConstraint::MustStartOn(d(2024, 1, 8));
        let later = c.resolve(d(2024, 1, 4), 2).unwrap();
        assert_eq!(later.window.start, d(2024, 1, 8));
        assert!(later.conflict.is_none());

        let earlier = c.resolve(d(2024, 1, 9), 2).unwrap();
        assert_eq!(earlier.window.start, d(2024, 1, 8));
        assert_eq!(earlier.conflict, Some(ViolationKind::PredecessorConflict));
    }

    #[test]
    fn test_must_finish_on_overrides() {
        let c = DateConstraint::MustFinishOn(d(2024, 1, 10));
        let r = c.resolve(d(2024, 1, 9), 3).unwrap();
        assert_eq!(r.window, DateWindow::new(d(2024, 1, 8), d(2024, 1, 10)));
        assert_eq!(r.conflict, Some(ViolationKind::PredecessorConflict));
    }

    #[test]
    fn test_latest_finish_limits() {
        assert_eq!(
            DateConstraint::StartNoLaterThan(d(2024, 1, 2)).latest_finish(3),
            Some(d(2024, 1, 4))
        );
        assert_eq!(
            DateConstraint::MustFinishOn(d(2024, 1, 9)).latest_finish(3),
            Some(d(2024, 1, 9))
        );
        assert_eq!(
            DateConstraint::StartNoEarlierThan(d(2024, 1, 2)).latest_finish(3),
            None
        );
    }

    #[test]
    fn test_resolve_out_of_calendar_range() {
        let pinned = DateConstraint::MustFinishOn(NaiveDate::MIN);
        assert!(pinned.resolve(NaiveDate::MIN, 3).is_none());
        assert!(DateConstraint::None.resolve(NaiveDate::MAX, 2).is_none());
        assert!(DateConstraint::None.resolve(NaiveDate::MAX, 1).is_some());
        assert_eq!(DateConstraint::StartNoLaterThan(NaiveDate::MAX).latest_finish(5), None);
    }

    #[test]
    fn test_satisfied_by() {
        let w = DateWindow::new(d(2024, 1, 4), d(2024, 1, 5));
        assert!(DateConstraint::None.is_satisfied_by(&w));
        assert!(DateConstraint::MustStartOn(d(2024, 1, 4)).is_satisfied_by(&w));
        assert!(!DateConstraint::FinishNoLaterThan(d(2024, 1, 4)).is_satisfied_by(&w));
    }

    #[test]
    fn test_serde_wire_shape() {
        let c = DateConstraint::MustStartOn(d(2024, 1, 2));
        let json = serde_json::to_value(c).unwrap();
        assert_eq!(json["constraint_type"], "must_start_on");
        assert_eq!(json["constraint_date"], "2024-01-02");

        let parsed: DateConstraint = serde_json::from_str(
            r#"{"constraint_type":"finish_no_later_than","constraint_date":"2024-03-01"}"#,
        )
        .unwrap();
        assert_eq!(parsed, DateConstraint::FinishNoLaterThan(d(2024, 3, 1)));

        let none: DateConstraint = serde_json::from_str(r#"{"constraint_type":"none"}"#).unwrap();
        assert_eq!(none, DateConstraint::None);
    }

    #[test]
    fn test_missing_date_rejected() {
        let parsed: Result<DateConstraint, _> =
            serde_json::from_str(r#"{"constraint_type":"must_start_on"}"#);
        assert!(parsed.is_err());
    }
}
