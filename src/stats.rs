use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

const WEEK_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayStatus {
    Completed,
    Pending,
    Future,
    BeforeHabitExisted,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub status: DayStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekPoint {
    pub label: String,
    pub percentage: f64,
}

/// Monday of the week containing `date`. Sunday anchors to the Monday six
/// days earlier.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Seven ordered day descriptors for the week containing `anchor`.
///
/// A day strictly after `today` is future no matter what the completion set
/// says; a day strictly before `created` predates the habit; otherwise set
/// membership decides.
pub fn week_grid(
    anchor: NaiveDate,
    completions: &BTreeSet<NaiveDate>,
    created: NaiveDate,
    today: NaiveDate,
) -> Vec<DayCell> {
    let monday = week_start(anchor);
    (0..7)
        .map(|offset| {
            let date = monday + Duration::days(offset);
            let status = if date > today {
                DayStatus::Future
            } else if date < created {
                DayStatus::BeforeHabitExisted
            } else if completions.contains(&date) {
                DayStatus::Completed
            } else {
                DayStatus::Pending
            };
            DayCell { date, status }
        })
        .collect()
}

/// Completion percentage for each of the trailing eight Monday-anchored
/// weeks, current partial week included, oldest first.
///
/// A week contributes a point only when it overlaps `[created, today]`;
/// labels W1..W8 follow the window position, so a skipped leading week skips
/// its label too.
pub fn weekly_progress(
    completions: &BTreeSet<NaiveDate>,
    created: NaiveDate,
    today: NaiveDate,
) -> Vec<WeekPoint> {
    let current_week_start = week_start(today);
    let mut points = Vec::with_capacity(WEEK_COUNT);

    for offset in (0..WEEK_COUNT).rev() {
        let start = current_week_start - Duration::weeks(offset as i64);

        let mut valid_days = 0u32;
        let mut completed_days = 0u32;
        for day_offset in 0..7 {
            let date = start + Duration::days(day_offset);
            if date >= created && date <= today {
                valid_days += 1;
                if completions.contains(&date) {
                    completed_days += 1;
                }
            }
        }

        if valid_days > 0 {
            points.push(WeekPoint {
                label: format!("W{}", WEEK_COUNT - offset),
                percentage: f64::from(completed_days) / f64::from(valid_days) * 100.0,
            });
        }
    }

    points
}

/// Consecutive completed days ending at `today`. A day missing from the set
/// breaks the run, so a habit not completed today has a current streak of 0.
pub fn current_streak(completions: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut date = today;
    while completions.contains(&date) {
        streak += 1;
        date = date - Duration::days(1);
    }
    streak
}

/// Longest run of consecutive completed days anywhere in the set.
pub fn longest_streak(completions: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for &date in completions {
        run = match previous {
            Some(prev) if date - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(date);
    }

    longest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dates(items: &[(i32, u32, u32)]) -> BTreeSet<NaiveDate> {
        items.iter().map(|&(y, m, d)| date(y, m, d)).collect()
    }

    #[test]
    fn week_start_anchors_sunday_to_previous_monday() {
        // 2024-01-14 is a Sunday.
        assert_eq!(week_start(date(2024, 1, 14)), date(2024, 1, 8));
        // Mondays are their own anchor.
        assert_eq!(week_start(date(2024, 1, 8)), date(2024, 1, 8));
        assert_eq!(week_start(date(2024, 1, 11)), date(2024, 1, 8));
    }

    #[test]
    fn grid_tags_each_day() {
        let completions = dates(&[(2024, 1, 9), (2024, 1, 10)]);
        let created = date(2024, 1, 9);
        let today = date(2024, 1, 11);

        let grid = week_grid(date(2024, 1, 11), &completions, created, today);
        assert_eq!(grid.len(), 7);
        assert_eq!(grid[0].date, date(2024, 1, 8));
        assert_eq!(grid[0].status, DayStatus::BeforeHabitExisted);
        assert_eq!(grid[1].status, DayStatus::Completed);
        assert_eq!(grid[2].status, DayStatus::Completed);
        assert_eq!(grid[3].status, DayStatus::Pending);
        assert_eq!(grid[4].status, DayStatus::Future);
        assert_eq!(grid[6].date, date(2024, 1, 14));
        assert_eq!(grid[6].status, DayStatus::Future);
    }

    #[test]
    fn grid_future_wins_over_completion() {
        // A completion recorded past today must still render as future.
        let completions = dates(&[(2024, 1, 12)]);
        let grid = week_grid(
            date(2024, 1, 11),
            &completions,
            date(2024, 1, 8),
            date(2024, 1, 11),
        );
        let friday = grid.iter().find(|d| d.date == date(2024, 1, 12)).unwrap();
        assert_eq!(friday.status, DayStatus::Future);
    }

    #[test]
    fn grid_is_stable_for_fixed_inputs() {
        let completions = dates(&[(2024, 1, 9)]);
        let first = week_grid(
            date(2024, 1, 10),
            &completions,
            date(2024, 1, 8),
            date(2024, 1, 10),
        );
        let second = week_grid(
            date(2024, 1, 10),
            &completions,
            date(2024, 1, 8),
            date(2024, 1, 10),
        );
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.date, b.date);
            assert_eq!(a.status, b.status);
        }
    }

    #[test]
    fn weekly_progress_skips_weeks_before_creation() {
        // Habit created mid-window: the leading weeks contribute nothing.
        let today = date(2024, 3, 14); // Thursday
        let created = date(2024, 3, 4); // Monday two weeks back
        let completions = dates(&[(2024, 3, 4), (2024, 3, 5), (2024, 3, 11)]);

        let points = weekly_progress(&completions, created, today);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].label, "W7");
        assert!((points[0].percentage - 2.0 / 7.0 * 100.0).abs() < 1e-9);
        assert_eq!(points[1].label, "W8");
        // Current week has 4 valid days (Mon..Thu), one completed.
        assert!((points[1].percentage - 25.0).abs() < 1e-9);
    }

    #[test]
    fn weekly_progress_never_exceeds_eight_points() {
        let today = date(2024, 6, 1);
        let created = date(2020, 1, 1);
        let points = weekly_progress(&BTreeSet::new(), created, today);
        assert_eq!(points.len(), 8);
        assert_eq!(points[0].label, "W1");
        assert_eq!(points[7].label, "W8");
        assert!(points.iter().all(|p| p.percentage == 0.0));
    }

    #[test]
    fn streaks_from_documented_scenario() {
        // Created 2024-01-10, completions on the 10th, 11th and 15th,
        // today 2024-01-16: nothing completed today, so no current streak;
        // the longest run is the 10th-11th pair.
        let completions = dates(&[(2024, 1, 10), (2024, 1, 11), (2024, 1, 15)]);
        let today = date(2024, 1, 16);
        assert_eq!(current_streak(&completions, today), 0);
        assert_eq!(longest_streak(&completions), 2);
    }

    #[test]
    fn streaks_on_empty_set_are_zero() {
        let completions = BTreeSet::new();
        assert_eq!(current_streak(&completions, date(2024, 1, 1)), 0);
        assert_eq!(longest_streak(&completions), 0);
    }

    #[test]
    fn current_streak_counts_run_ending_today() {
        let completions = dates(&[(2024, 2, 1), (2024, 2, 2), (2024, 2, 3)]);
        assert_eq!(current_streak(&completions, date(2024, 2, 3)), 3);
        assert_eq!(current_streak(&completions, date(2024, 2, 4)), 0);
    }

    #[test]
    fn streak_figures_stay_ordered() {
        let samples = [
            dates(&[]),
            dates(&[(2024, 5, 1)]),
            dates(&[(2024, 5, 1), (2024, 5, 2), (2024, 5, 7)]),
            dates(&[(2024, 5, 5), (2024, 5, 6), (2024, 5, 7), (2024, 5, 8)]),
        ];
        let today = date(2024, 5, 8);
        for completions in &samples {
            let current = current_streak(completions, today);
            let longest = longest_streak(completions);
            assert!(current <= longest);
            assert!(longest as usize <= completions.len());
        }
    }
}
