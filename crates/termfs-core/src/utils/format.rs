//! Formatting utilities for sizes, dates, durations and calendars.

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Format a byte count. Human form uses binary units ("4.0K", "1.5M").
pub fn format_size(bytes: u64, human: bool) -> String {
    if !human {
        return bytes.to_string();
    }
    const UNITS: [&str; 4] = ["K", "M", "G", "T"];
    if bytes < 1024 {
        return bytes.to_string();
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", value, UNITS[unit])
}

/// Broken-down UTC time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateTime {
    pub year: i64,
    /// 1-12
    pub month: u32,
    /// 1-31
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    /// 0 = Sunday
    pub weekday: u32,
}

impl DateTime {
    /// Convert milliseconds since the Unix epoch.
    pub fn from_millis(ms: u64) -> Self {
        let secs = ms / 1000;
        let days = (secs / 86_400) as i64;
        let rem = secs % 86_400;
        let (year, month, day) = civil_from_days(days);
        Self {
            year,
            month,
            day,
            hour: (rem / 3600) as u32,
            minute: ((rem % 3600) / 60) as u32,
            second: (rem % 60) as u32,
            // 1970-01-01 was a Thursday
            weekday: ((days + 4).rem_euclid(7)) as u32,
        }
    }

    pub fn month_abbrev(&self) -> &'static str {
        MONTHS[(self.month - 1) as usize]
    }

    pub fn weekday_abbrev(&self) -> &'static str {
        WEEKDAYS[self.weekday as usize]
    }
}

/// Days since the epoch to (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// (year, month, day) to days since the epoch.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y.rem_euclid(400);
    let m = i64::from(month);
    let mp = if m > 2 { m - 3 } else { m + 9 };
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Listing timestamp, e.g. "Jan  5 12:34".
pub fn format_date_short(ms: u64) -> String {
    let dt = DateTime::from_millis(ms);
    format!(
        "{} {:2} {:02}:{:02}",
        dt.month_abbrev(),
        dt.day,
        dt.hour,
        dt.minute
    )
}

/// ISO date (YYYY-MM-DD).
pub fn format_date_iso(ms: u64) -> String {
    let dt = DateTime::from_millis(ms);
    format!("{:04}-{:02}-{:02}", dt.year, dt.month, dt.day)
}

/// `date` output, e.g. "Thu Jan  1 00:00:00 UTC 1970".
pub fn format_date_long(ms: u64) -> String {
    let dt = DateTime::from_millis(ms);
    format!(
        "{} {} {:2} {:02}:{:02}:{:02} UTC {}",
        dt.weekday_abbrev(),
        dt.month_abbrev(),
        dt.day,
        dt.hour,
        dt.minute,
        dt.second,
        dt.year
    )
}

/// Elapsed time in `uptime` style: "5 min", "2:07", "3 days, 4:05".
pub fn format_duration(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;
    let clock = if hours == 0 {
        format!("{} min", minutes)
    } else {
        format!("{}:{:02}", hours, minutes)
    };
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}

pub fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

pub fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Render a month grid in `cal` layout.
///
/// Returns `None` for a month outside 1-12.
pub fn format_calendar(year: i64, month: u32) -> Option<String> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let title = format!("{} {}", MONTH_NAMES[(month - 1) as usize], year);
    let mut lines = vec![format!("{:^20}", title).trim_end().to_string()];
    lines.push("Su Mo Tu We Th Fr Sa".to_string());

    let first_weekday = (days_from_civil(year, month, 1) + 4).rem_euclid(7) as usize;
    let mut cells: Vec<String> = vec!["  ".to_string(); first_weekday];
    cells.extend((1..=days_in_month(year, month)).map(|day| format!("{:2}", day)));
    for week in cells.chunks(7) {
        lines.push(week.join(" ").trim_end().to_string());
    }
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500, false), "500");
        assert_eq!(format_size(4096, false), "4096");
        assert_eq!(format_size(500, true), "500");
        assert_eq!(format_size(4096, true), "4.0K");
        assert_eq!(format_size(1536 * 1024, true), "1.5M");
    }

    #[test]
    fn test_format_date_iso() {
        assert_eq!(format_date_iso(0), "1970-01-01");
        // 2024-01-01 00:00:00 UTC
        assert_eq!(format_date_iso(1_704_067_200_000), "2024-01-01");
        // leap day
        assert_eq!(format_date_iso(1_709_164_800_000), "2024-02-29");
    }

    #[test]
    fn test_format_date_long() {
        assert_eq!(format_date_long(0), "Thu Jan  1 00:00:00 UTC 1970");
        assert_eq!(
            format_date_long(1_704_067_200_000 + 3_723_000),
            "Mon Jan  1 01:02:03 UTC 2024"
        );
    }

    #[test]
    fn test_format_date_short() {
        assert_eq!(format_date_short(0), "Jan  1 00:00");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(300), "5 min");
        assert_eq!(format_duration(7_620), "2:07");
        assert_eq!(format_duration(86_400 + 60), "1 day, 1 min");
        assert_eq!(format_duration(3 * 86_400 + 4 * 3600 + 300), "3 days, 4:05");
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2023, 4), 30);
    }

    #[test]
    fn test_format_calendar() {
        let cal = format_calendar(1970, 1).unwrap();
        let lines: Vec<_> = cal.lines().collect();
        assert_eq!(lines[0], "    January 1970");
        assert_eq!(lines[1], "Su Mo Tu We Th Fr Sa");
        assert_eq!(lines[2], "             1  2  3");
        assert_eq!(lines[6], "25 26 27 28 29 30 31");
        assert!(format_calendar(2024, 13).is_none());
    }
}
