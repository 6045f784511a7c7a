//! Shift boundaries and lot numbering.
//!
//! Shifts change over five minutes early so the incoming crew can log in
//! before the hour: morning covers 07:55-15:54, afternoon 15:55-23:54 and
//! night the rest. A night shift that runs past midnight keeps the previous
//! day's date in lot numbers and report attribution until 08:00.

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, Timelike};

use crate::types::{Group, LineId, Shift};

/// Which shift a wall-clock instant belongs to.
pub fn infer_shift(at: DateTime<Local>) -> Shift {
    let (h, m) = (at.hour(), at.minute());
    if (h == 7 && m >= 55) || (8..15).contains(&h) || (h == 15 && m < 55) {
        Shift::Morning
    } else if (h == 15 && m >= 55) || (16..23).contains(&h) || (h == 23 && m < 55) {
        Shift::Afternoon
    } else {
        Shift::Night
    }
}

/// Production date for lot attribution: a night shift before 08:00 belongs
/// to the previous calendar day.
pub fn lot_date(shift: Shift, now: DateTime<Local>) -> NaiveDate {
    if shift == Shift::Night && now.hour() < 8 {
        now.date_naive()
            .checked_sub_days(Days::new(1))
            .unwrap_or_else(|| now.date_naive())
    } else {
        now.date_naive()
    }
}

/// Lot number: `{line digits}{year last digit}{MM}{DD}{shift code}{group
/// code}T`, e.g. "36011511T" for Line 3, 2026-01-15, morning shift, crew A.
pub fn lot_number(line: &LineId, shift: Shift, group: Group, now: DateTime<Local>) -> String {
    let date = lot_date(shift, now);
    let digits: String = line
        .as_str()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    let line_part = if digits.is_empty() {
        "0".to_string()
    } else {
        digits
    };
    format!(
        "{line_part}{}{:02}{:02}{}{}T",
        date.year().rem_euclid(10),
        date.month(),
        date.day(),
        shift.code(),
        group.code()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .single()
            .expect("unambiguous local time")
    }

    #[rstest]
    #[case(7, 54, Shift::Night)]
    #[case(7, 55, Shift::Morning)]
    #[case(12, 0, Shift::Morning)]
    #[case(15, 54, Shift::Morning)]
    #[case(15, 55, Shift::Afternoon)]
    #[case(23, 54, Shift::Afternoon)]
    #[case(23, 55, Shift::Night)]
    #[case(0, 30, Shift::Night)]
    #[case(3, 0, Shift::Night)]
    fn shift_windows_flip_five_minutes_early(
        #[case] h: u32,
        #[case] m: u32,
        #[case] expected: Shift,
    ) {
        assert_eq!(infer_shift(at(2026, 1, 15, h, m)), expected);
    }

    #[test]
    fn night_shift_before_eight_uses_previous_date() {
        let d = lot_date(Shift::Night, at(2026, 1, 15, 2, 30));
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 14).unwrap());
    }

    #[test]
    fn night_shift_at_open_keeps_current_date() {
        // 23:55 open: still the same calendar day.
        let d = lot_date(Shift::Night, at(2026, 1, 15, 23, 55));
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
    }

    #[test]
    fn day_shifts_keep_current_date() {
        let d = lot_date(Shift::Morning, at(2026, 1, 15, 9, 0));
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
    }

    #[test]
    fn lot_number_format() {
        let lot = lot_number(
            &LineId::new("Line 3"),
            Shift::Morning,
            Group::A,
            at(2026, 1, 15, 9, 0),
        );
        assert_eq!(lot, "36011511T");
    }

    #[test]
    fn lot_number_night_crossover() {
        // Night shift at 02:00 on Jan 16 is attributed to Jan 15.
        let lot = lot_number(
            &LineId::new("Line 2"),
            Shift::Night,
            Group::D,
            at(2026, 1, 16, 2, 0),
        );
        assert_eq!(lot, "26011534T");
    }

    #[test]
    fn lot_number_without_line_digits_uses_zero() {
        let lot = lot_number(
            &LineId::new("Pilot"),
            Shift::Afternoon,
            Group::B,
            at(2026, 1, 15, 16, 0),
        );
        assert!(lot.starts_with("06"));
    }
}
