use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::traits::Clock;

/// Calendar fields the traffic models were trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarContext {
    /// Pinned to the training reference year, not the real current year.
    pub year: i32,
    pub month: u32,
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u32,
    /// ISO week number
    pub week_of_year: u32,
    pub is_weekend: bool,
    pub is_holiday: bool,
}

impl CalendarContext {
    /// Build the context for a date. Holidays are looked up for the real date.
    pub fn for_date(date: NaiveDate, reference_year: i32) -> Self {
        let day_of_week = date.weekday().num_days_from_monday();
        Self {
            year: reference_year,
            month: date.month(),
            day_of_week,
            week_of_year: date.iso_week().week(),
            is_weekend: day_of_week >= 5,
            is_holiday: is_us_holiday(date),
        }
    }

    /// Context for the clock's current local date.
    pub fn today(clock: &dyn Clock, reference_year: i32) -> Self {
        Self::for_date(clock.local_date(), reference_year)
    }
}

/// Full weekday name for a 0 = Monday index.
pub fn weekday_name(day_of_week: u32) -> &'static str {
    match day_of_week {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        6 => "Sunday",
        _ => "Unknown",
    }
}

/// Check if a date is a US federal holiday, including observed dates.
pub fn is_us_holiday(date: NaiveDate) -> bool {
    let year = date.year();
    // Dec 31 can be the observed New Year's Day of the following year
    us_federal_holidays(year).contains(&date) || us_federal_holidays(year + 1).contains(&date)
}

/// All US federal holiday dates for a year, actual and observed.
///
/// Observed dates of fixed holidays may fall outside `year`
/// (New Year's Day on a Saturday is observed on Dec 31).
pub fn us_federal_holidays(year: i32) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(16);

    // 1. Fixed-date holidays and their observed weekdays
    let mut fixed = vec![(1, 1), (7, 4), (11, 11), (12, 25)];
    if year >= 2021 {
        fixed.push((6, 19)); // Juneteenth
    }
    for (month, day) in fixed {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            dates.push(date);
            if let Some(observed) = observed_date(date) {
                dates.push(observed);
            }
        }
    }

    // 2. Floating Monday/Thursday holidays
    let floating = [
        nth_weekday(year, 1, Weekday::Mon, 3),  // Martin Luther King Jr. Day
        nth_weekday(year, 2, Weekday::Mon, 3),  // Washington's Birthday
        last_weekday(year, 5, Weekday::Mon),    // Memorial Day
        nth_weekday(year, 9, Weekday::Mon, 1),  // Labor Day
        nth_weekday(year, 10, Weekday::Mon, 2), // Columbus Day
        nth_weekday(year, 11, Weekday::Thu, 4), // Thanksgiving
    ];
    dates.extend(floating.into_iter().flatten());

    dates
}

/// Saturday holidays are observed the Friday before, Sunday holidays the Monday after.
fn observed_date(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => Some(date - Duration::days(1)),
        Weekday::Sun => Some(date + Duration::days(1)),
        _ => None,
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last_of_month = first_of_next - Duration::days(1);
    let back = (7 + last_of_month.weekday().num_days_from_monday()
        - weekday.num_days_from_monday())
        % 7;
    Some(last_of_month - Duration::days(back as i64))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::traits::MockClock;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    // ==================== Floating Holiday Tests ====================

    #[test]
    fn test_floating_holidays_2025() {
        assert!(is_us_holiday(date(2025, 1, 20))); // MLK Day
        assert!(is_us_holiday(date(2025, 2, 17))); // Washington's Birthday
        assert!(is_us_holiday(date(2025, 5, 26))); // Memorial Day
        assert!(is_us_holiday(date(2025, 9, 1))); // Labor Day
        assert!(is_us_holiday(date(2025, 10, 13))); // Columbus Day
        assert!(is_us_holiday(date(2025, 11, 27))); // Thanksgiving
    }

    #[test]
    fn test_memorial_day_when_may_ends_on_monday() {
        // May 31, 2027 is a Monday
        assert_eq!(last_weekday(2027, 5, Weekday::Mon), Some(date(2027, 5, 31)));
    }

    #[test]
    fn test_last_weekday_december() {
        // Dec 31, 2025 is a Wednesday; last Monday is Dec 29
        assert_eq!(last_weekday(2025, 12, Weekday::Mon), Some(date(2025, 12, 29)));
    }

    // ==================== Fixed Holiday Tests ====================

    #[test]
    fn test_fixed_holidays_2025() {
        assert!(is_us_holiday(date(2025, 1, 1)));
        assert!(is_us_holiday(date(2025, 6, 19)));
        assert!(is_us_holiday(date(2025, 7, 4)));
        assert!(is_us_holiday(date(2025, 11, 11)));
        assert!(is_us_holiday(date(2025, 12, 25)));
    }

    #[test]
    fn test_juneteenth_only_from_2021() {
        assert!(!is_us_holiday(date(2019, 6, 19)));
        assert!(is_us_holiday(date(2021, 6, 19)));
    }

    #[test]
    fn test_observed_saturday_moves_to_friday() {
        // July 4, 2026 is a Saturday
        assert!(is_us_holiday(date(2026, 7, 4)));
        assert!(is_us_holiday(date(2026, 7, 3)));
    }

    #[test]
    fn test_observed_sunday_moves_to_monday() {
        // Nov 11, 2029 is a Sunday
        assert!(is_us_holiday(date(2029, 11, 12)));
    }

    #[test]
    fn test_new_year_observed_on_previous_dec_31() {
        // Jan 1, 2022 was a Saturday
        assert!(is_us_holiday(date(2021, 12, 31)));
    }

    #[test]
    fn test_regular_days_not_holiday() {
        assert!(!is_us_holiday(date(2025, 6, 4)));
        assert!(!is_us_holiday(date(2025, 3, 12)));
        assert!(!is_us_holiday(date(2025, 12, 31)));
    }

    // ==================== CalendarContext Tests ====================

    #[test]
    fn test_context_pins_reference_year() {
        let ctx = CalendarContext::for_date(date(2026, 10, 17), 2025);
        assert_eq!(ctx.year, 2025);
        assert_eq!(ctx.month, 10);
        assert_eq!(ctx.day_of_week, 5); // Saturday
        assert_eq!(ctx.week_of_year, 42);
        assert!(ctx.is_weekend);
        assert!(!ctx.is_holiday);
    }

    #[test]
    fn test_context_weekday() {
        // June 4, 2025 is a Wednesday in ISO week 23
        let ctx = CalendarContext::for_date(date(2025, 6, 4), 2025);
        assert_eq!(ctx.day_of_week, 2);
        assert_eq!(ctx.week_of_year, 23);
        assert!(!ctx.is_weekend);
    }

    #[test]
    fn test_context_holiday_uses_real_date() {
        // Thanksgiving 2026 is Nov 26; the reference year must not affect the lookup
        let ctx = CalendarContext::for_date(date(2026, 11, 26), 2025);
        assert!(ctx.is_holiday);
    }

    #[test]
    fn test_context_today_uses_local_date() {
        // Late evening of July 3 in Florida is already July 4 in UTC
        let clock = MockClock::new(Utc.with_ymd_and_hms(2025, 7, 4, 2, 0, 0).unwrap())
            .with_offset_hours(-4);
        let ctx = CalendarContext::today(&clock, 2025);
        assert_eq!(ctx.month, 7);
        assert_eq!(ctx.day_of_week, 3); // Thursday
        assert!(!ctx.is_holiday);
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(weekday_name(0), "Monday");
        assert_eq!(weekday_name(4), "Friday");
        assert_eq!(weekday_name(6), "Sunday");
        assert_eq!(weekday_name(7), "Unknown");
    }

    // ==================== Property-Based Tests ====================

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn thanksgiving_is_thursday_in_november(year in 1950i32..2100) {
                let thanksgiving = nth_weekday(year, 11, Weekday::Thu, 4).unwrap();
                prop_assert_eq!(thanksgiving.weekday(), Weekday::Thu);
                prop_assert!((22..=28).contains(&thanksgiving.day()));
            }

            #[test]
            fn memorial_day_is_in_last_week_of_may(year in 1950i32..2100) {
                let memorial = last_weekday(year, 5, Weekday::Mon).unwrap();
                prop_assert_eq!(memorial.weekday(), Weekday::Mon);
                prop_assert!(memorial.day() >= 25);
            }

            #[test]
            fn observed_dates_fall_on_weekdays(year in 1950i32..2100) {
                for (month, day) in [(1, 1), (7, 4), (11, 11), (12, 25)] {
                    let actual = NaiveDate::from_ymd_opt(year, month, day).unwrap();
                    if let Some(observed) = observed_date(actual) {
                        prop_assert!(observed.weekday().num_days_from_monday() < 5);
                    }
                }
            }

            #[test]
            fn weekend_flag_matches_day_of_week(ordinal in 1u32..=365) {
                let d = NaiveDate::from_yo_opt(2025, ordinal).unwrap();
                let ctx = CalendarContext::for_date(d, 2025);
                prop_assert_eq!(ctx.is_weekend, ctx.day_of_week >= 5);
            }
        }
    }
}
