//! Rolling day-of-year window pooled across every observed year.

use crate::observation::DailyObservation;

/// Days on each side of the center day.
pub const WINDOW_RADIUS: i32 = 2;

/// Folds a day-of-year at most [`WINDOW_RADIUS`] outside `1..=366` back into range.
///
/// Day 0 and below borrow from the end of a 365-day year, days past 366 restart at 1.
/// The mismatch between the two offsets is accepted leap-year drift.
pub fn wrap_day(day: i32) -> u32 {
    let wrapped = if day < 1 {
        day + 365
    } else if day > 366 {
        day - 366
    } else {
        day
    };
    wrapped as u32
}

/// The five day-of-year integers centered on `center`.
pub fn window_days(center: u32) -> [u32; 5] {
    let center = center as i32;
    let mut days = [0u32; 5];
    for (slot, offset) in days.iter_mut().zip(-WINDOW_RADIUS..=WINDOW_RADIUS) {
        *slot = wrap_day(center + offset);
    }
    days
}

/// Observations from every year whose day-of-year falls inside the window around `center`.
pub fn select_window(observations: &[DailyObservation], center: u32) -> Vec<&DailyObservation> {
    let days = window_days(center);
    observations
        .iter()
        .filter(|o| days.contains(&o.day_of_year()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(y: i32, m: u32, d: u32) -> DailyObservation {
        DailyObservation::empty(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_wrap_day_edges() {
        assert_eq!(wrap_day(-1), 364);
        assert_eq!(wrap_day(0), 365);
        assert_eq!(wrap_day(1), 1);
        assert_eq!(wrap_day(366), 366);
        assert_eq!(wrap_day(367), 1);
        assert_eq!(wrap_day(368), 2);
    }

    #[test]
    fn test_window_mid_year() {
        assert_eq!(window_days(100), [98, 99, 100, 101, 102]);
    }

    #[test]
    fn test_window_wraps_at_new_year() {
        assert_eq!(window_days(1), [364, 365, 1, 2, 3]);
        assert_eq!(window_days(2), [365, 1, 2, 3, 4]);
    }

    #[test]
    fn test_window_wraps_at_year_end() {
        assert_eq!(window_days(365), [363, 364, 365, 366, 1]);
        assert_eq!(window_days(366), [364, 365, 366, 1, 2]);
    }

    #[test]
    fn test_window_always_has_five_distinct_days() {
        for center in 1..=366 {
            let mut days = window_days(center).to_vec();
            days.sort_unstable();
            days.dedup();
            assert_eq!(days.len(), 5, "center {center}");
            assert!(days.iter().all(|d| (1..=366).contains(d)));
        }
    }

    #[test]
    fn test_select_window_pools_years_and_wraps() {
        let observations = vec![
            obs(2019, 12, 30),
            obs(2019, 12, 31),
            obs(2020, 1, 1),
            obs(2020, 1, 3),
            obs(2020, 1, 4),
            obs(2021, 1, 2),
            obs(2021, 6, 1),
        ];

        let window = select_window(&observations, 1);
        let dates: Vec<String> = window.iter().map(|o| o.date.to_string()).collect();

        assert_eq!(
            dates,
            vec!["2019-12-30", "2019-12-31", "2020-01-01", "2020-01-03", "2021-01-02"]
        );
    }
}
