/// Streak calculation over cadence periods
///
/// This is the single place that walks completion days. Days are first
/// mapped to cadence periods (day, rolling 7-day window, calendar month);
/// streaks are runs of consecutive periods holding at least one completion.

use std::collections::BTreeSet;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::domain::{days_between, DayKey, Frequency};

/// Current and best streak for a habit, counted in cadence periods
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    /// Consecutive periods ending at today's period (or the previous one,
    /// while today's period is still open)
    pub current: u32,
    /// Longest run of consecutive periods anywhere in the history
    pub best: u32,
}

/// Compute current and best streak
///
/// The result depends only on the set of days given: order and duplicates
/// don't matter. Days after `today` are ignored.
pub fn compute_streaks<I>(frequency: Frequency, completed_days: I, today: DayKey) -> StreakSummary
where
    I: IntoIterator<Item = DayKey>,
{
    let periods: BTreeSet<i64> = completed_days
        .into_iter()
        .filter(|day| *day <= today)
        .map(|day| period_index(frequency, day, today))
        .collect();

    if periods.is_empty() {
        return StreakSummary::default();
    }

    StreakSummary {
        current: current_streak(&periods, period_index(frequency, today, today)),
        best: longest_run(&periods),
    }
}

/// Map a day to an integer period so that consecutive periods differ by one
///
/// Weekly windows are anchored on `today`: window 0 is `[today-6, today]`,
/// window -1 the seven days before that, and so on.
fn period_index(frequency: Frequency, day: DayKey, today: DayKey) -> i64 {
    match frequency {
        Frequency::Daily => day.date().num_days_from_ce() as i64,
        Frequency::Weekly => -(days_between(day, today).div_euclid(7)),
        Frequency::Monthly => day.month_index(),
    }
}

/// Walk back from today's period. An empty current period is still open,
/// so counting starts from the one before it.
fn current_streak(periods: &BTreeSet<i64>, today_period: i64) -> u32 {
    let mut period = if periods.contains(&today_period) {
        today_period
    } else {
        today_period - 1
    };

    let mut streak = 0;
    while periods.contains(&period) {
        streak += 1;
        period -= 1;
    }
    streak
}

/// Single ascending pass over distinct periods
fn longest_run(periods: &BTreeSet<i64>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut last: Option<i64> = None;

    for &period in periods {
        run = match last {
            Some(prev) if period == prev + 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        last = Some(period);
    }

    longest
}
