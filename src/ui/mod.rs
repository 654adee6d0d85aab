use chrono::{Datelike, NaiveDate};

pub mod map;
pub mod panels;
pub mod plot;
pub mod table;

/// Plot x coordinate for a date: days since 0001-01-01.
pub fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Inverse of [`day_number`], rounding to the nearest day.
pub fn date_from_day(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() || x.abs() > i32::MAX as f64 {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_numbers_round_trip() {
        let d = NaiveDate::from_ymd_opt(2019, 7, 14).unwrap();
        assert_eq!(date_from_day(day_number(d)), Some(d));
        assert_eq!(date_from_day(day_number(d) + 0.4), Some(d));
        assert_eq!(date_from_day(f64::NAN), None);
    }
}
