use time::format_description::FormatItem;
use time::macros::{format_description, offset};
use time::{Date, OffsetDateTime, UtcOffset};

/// All "today" computations run on the store's civil time: a fixed +05:30
/// offset from UTC, independent of the host timezone.
pub const IST: UtcOffset = offset!(+5:30);

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

pub fn ist_now() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(IST)
}

pub fn ist_today() -> Date {
    ist_now().date()
}

/// `YYYY-MM-DD`, as stored in the Date column.
pub fn date_string(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// `HH:MM:SS`, as stored in the Time column.
pub fn time_string(at: OffsetDateTime) -> String {
    at.time()
        .format(TIME_FORMAT)
        .unwrap_or_else(|_| at.time().to_string())
}

pub fn parse_date(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(s, DATE_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn utc_instant_lands_on_ist_civil_date() {
        // 23:00 UTC is already the next morning in IST.
        let at = datetime!(2024-04-30 23:00:00 UTC).to_offset(IST);
        assert_eq!(date_string(at.date()), "2024-05-01");
        assert_eq!(time_string(at), "04:30:00");
    }

    #[test]
    fn formats_are_zero_padded() {
        let at = datetime!(2024-05-01 09:05:03 +5:30);
        assert_eq!(date_string(at.date()), "2024-05-01");
        assert_eq!(time_string(at), "09:05:03");
    }

    #[test]
    fn parse_round_trips() {
        let d = parse_date("2024-05-01").expect("parse");
        assert_eq!(date_string(d), "2024-05-01");
        assert!(parse_date("01/05/2024").is_err());
    }
}
