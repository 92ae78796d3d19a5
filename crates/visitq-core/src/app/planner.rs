//! TransitionTimePlanner - when does a new submission become eligible?
//!
//! `immediate` submissions carry no schedule and go out on the next tick.
//! `daily` submissions get a uniformly random instant inside an eligibility
//! window, which spreads visits over the day instead of bursting them:
//!
//! - two hours or more left until local midnight: `[now, 23:59:59 today]`
//! - less than two hours left: `[00:00:00, 23:59:59]` of the next day

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Offset, Utc};
use rand::Rng;

use crate::domain::TransitionMode;

/// Below this much time left in the local day, the window moves to tomorrow.
pub const LATE_DAY_CUTOFF_SECS: i64 = 2 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// Linear interpolation; `sample` is clamped to `[0, 1]`.
    pub fn at(&self, sample: f64) -> DateTime<Utc> {
        let span_ms = (self.end - self.start).num_milliseconds() as f64;
        let offset_ms = (span_ms * sample.clamp(0.0, 1.0)) as i64;
        self.start + Duration::milliseconds(offset_ms)
    }

    #[cfg(test)]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Computes schedules in one local time zone.
#[derive(Debug, Clone, Copy)]
pub struct TransitionTimePlanner {
    offset: FixedOffset,
}

impl TransitionTimePlanner {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn compute<R: Rng + ?Sized>(
        &self,
        now: DateTime<Utc>,
        mode: TransitionMode,
        rng: &mut R,
    ) -> Option<DateTime<Utc>> {
        match mode {
            TransitionMode::Immediate => None,
            TransitionMode::Daily => Some(self.daily_window(now).at(rng.r#gen::<f64>())),
        }
    }

    pub fn daily_window(&self, now: DateTime<Utc>) -> Window {
        let local_today = now.with_timezone(&self.offset).date_naive();
        let tomorrow = local_today.succ_opt().unwrap_or(local_today);
        let next_midnight = self.to_utc(tomorrow.and_time(Default::default()));
        let one_second = Duration::seconds(1);

        if next_midnight - now < Duration::seconds(LATE_DAY_CUTOFF_SECS) {
            Window {
                start: next_midnight,
                end: next_midnight + Duration::days(1) - one_second,
            }
        } else {
            Window {
                start: now,
                end: next_midnight - one_second,
            }
        }
    }

    fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        let utc = local - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc, Utc)
    }
}

impl Default for TransitionTimePlanner {
    fn default() -> Self {
        Self::utc()
    }
}
