//! 通用工具函数
//!
//! 日历边界均按 UTC 计算。

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use uuid::Uuid;

/// 生成新的实体ID
pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// 当天 00:00:00.000
pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    midnight(at.date_naive())
}

/// 当天 23:59:59.999
pub fn end_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(at) + Duration::days(1) - Duration::milliseconds(1)
}

/// 当月第一天 00:00:00.000
pub fn start_of_month(at: DateTime<Utc>) -> DateTime<Utc> {
    let date = at.date_naive();
    midnight(NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date))
}

/// 当月最后一天 23:59:59.999
pub fn end_of_month(at: DateTime<Utc>) -> DateTime<Utc> {
    let date = at.date_naive();
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let next = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date);
    midnight(next) - Duration::milliseconds(1)
}

/// 当年1月1日 00:00:00.000
pub fn start_of_year(at: DateTime<Utc>) -> DateTime<Utc> {
    let date = at.date_naive();
    midnight(NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date))
}

/// 宽松解析时间字符串：RFC 3339、无时区的日期时间（按UTC）或纯日期
pub fn parse_flexible_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().map(midnight)
}

/// 四舍五入到指定小数位
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_day_bounds() {
        let now = at("2024-03-15T10:20:30Z");
        assert_eq!(start_of_day(now), at("2024-03-15T00:00:00Z"));
        assert_eq!(end_of_day(now), at("2024-03-15T23:59:59.999Z"));
    }

    #[test]
    fn test_month_bounds() {
        let now = at("2024-02-10T08:00:00Z");
        assert_eq!(start_of_month(now), at("2024-02-01T00:00:00Z"));
        assert_eq!(end_of_month(now), at("2024-02-29T23:59:59.999Z"));

        let december = at("2023-12-31T23:00:00Z");
        assert_eq!(end_of_month(december), at("2023-12-31T23:59:59.999Z"));
        assert_eq!(start_of_year(december), at("2023-01-01T00:00:00Z"));
    }

    #[test]
    fn test_parse_flexible_datetime() {
        assert_eq!(
            parse_flexible_datetime("2024-01-15T09:30:00+01:00"),
            Some(at("2024-01-15T08:30:00Z"))
        );
        assert_eq!(parse_flexible_datetime("2024-01-15"), Some(at("2024-01-15T00:00:00Z")));
        assert_eq!(
            parse_flexible_datetime("2024-01-15T09:30:00.250"),
            Some(at("2024-01-15T09:30:00.250Z"))
        );
        assert_eq!(parse_flexible_datetime("15/01/2024"), None);
        assert_eq!(parse_flexible_datetime(""), None);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(24.691, 1), 24.7);
        assert_eq!(round_to(24.649, 1), 24.6);
    }
}
