use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, Weekday};

/// A resolved point in time, with enough granularity information to decide
/// date-only vs timestamp comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub dt: NaiveDateTime,
    /// Whether the source encoded a clock time (vs a bare date).
    pub has_time: bool,
    /// Whether the source was a relative "now" marker.
    pub is_now: bool,
}

impl ResolvedDate {
    fn date(d: NaiveDate) -> Self {
        ResolvedDate {
            dt: d.and_hms_opt(0, 0, 0).unwrap_or_default(),
            has_time: false,
            is_now: false,
        }
    }

    /// Canonical tag-value form: `YYYY-MM-DD` or `YYYY-MM-DD HH:MM`.
    pub fn canonical(&self) -> String {
        if self.has_time {
            self.dt.format("%Y-%m-%d %H:%M").to_string()
        } else {
            self.dt.format("%Y-%m-%d").to_string()
        }
    }
}

/// Strict timestamp grammar for stored tag values.
pub fn parse_timestamp(s: &str) -> Option<ResolvedDate> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ResolvedDate {
                dt,
                has_time: true,
                is_now: false,
            });
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(ResolvedDate::date)
}

/// Injected date-resolution capability. Criterion values go through this;
/// stored tag values only ever use the strict grammar above.
pub trait DateResolver {
    fn resolve(&self, phrase: &str) -> Option<ResolvedDate>;
}

/// Default resolver: strict timestamps plus a small set of phrases —
/// `now`, `today`, `tomorrow`, `yesterday`, weekday names (next occurrence),
/// and signed offsets like `3d`, `+2w`, `-12h`. Full NLP is a non-goal.
#[derive(Debug, Clone)]
pub struct ChronoResolver {
    pub now: NaiveDateTime,
}

impl Default for ChronoResolver {
    fn default() -> Self {
        ChronoResolver {
            now: Local::now().naive_local(),
        }
    }
}

impl ChronoResolver {
    pub fn at(now: NaiveDateTime) -> Self {
        ChronoResolver { now }
    }
}

impl DateResolver for ChronoResolver {
    fn resolve(&self, phrase: &str) -> Option<ResolvedDate> {
        if let Some(ts) = parse_timestamp(phrase) {
            return Some(ts);
        }

        let today = self.now.date();
        match phrase.trim().to_lowercase().as_str() {
            "now" => Some(ResolvedDate {
                dt: self.now,
                has_time: true,
                is_now: true,
            }),
            "today" => Some(ResolvedDate::date(today)),
            "tomorrow" => Some(ResolvedDate::date(today + Duration::days(1))),
            "yesterday" => Some(ResolvedDate::date(today - Duration::days(1))),
            other => {
                if let Some(wd) = parse_weekday(other) {
                    let ahead = days_until(today.weekday(), wd);
                    return Some(ResolvedDate::date(today + Duration::days(ahead)));
                }
                parse_offset(other, self.now)
            }
        }
    }
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Days until the next occurrence of `target`, always in the future (a
/// weekday phrase on that same weekday means next week).
fn days_until(from: Weekday, target: Weekday) -> i64 {
    let delta = (target.num_days_from_monday() as i64
        - from.num_days_from_monday() as i64)
        .rem_euclid(7);
    if delta == 0 { 7 } else { delta }
}

/// `[+|-]N[d|w|h]` relative offset from now. Bare numbers count days.
fn parse_offset(s: &str, now: NaiveDateTime) -> Option<ResolvedDate> {
    let (sign, rest) = match s.strip_prefix('-') {
        Some(r) => (-1i64, r),
        None => (1i64, s.strip_prefix('+').unwrap_or(s)),
    };
    let unit = rest.chars().last().filter(|c| c.is_ascii_alphabetic());
    let digits = match unit {
        Some(_) => &rest[..rest.len() - 1],
        None => rest,
    };
    if digits.is_empty() {
        return None;
    }
    let n: i64 = digits.parse().ok()?;
    let n = n * sign;
    match unit {
        None | Some('d') => Some(ResolvedDate::date(now.date() + Duration::days(n))),
        Some('w') => Some(ResolvedDate::date(now.date() + Duration::weeks(n))),
        Some('h') => Some(ResolvedDate {
            dt: now + Duration::hours(n),
            has_time: true,
            is_now: false,
        }),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 4) // a Wednesday
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_strict_date() {
        let r = parse_timestamp("2025-01-01").unwrap();
        assert!(!r.has_time);
        assert_eq!(r.canonical(), "2025-01-01");
    }

    #[test]
    fn test_strict_datetime() {
        let r = parse_timestamp("2025-01-01 09:30").unwrap();
        assert!(r.has_time);
        assert_eq!(r.canonical(), "2025-01-01 09:30");
    }

    #[test]
    fn test_strict_rejects_garbage() {
        assert!(parse_timestamp("next tuesday").is_none());
        assert!(parse_timestamp("4").is_none());
    }

    #[test]
    fn test_resolve_today_tomorrow() {
        let res = ChronoResolver::at(noon());
        assert_eq!(res.resolve("today").unwrap().canonical(), "2025-06-04");
        assert_eq!(res.resolve("tomorrow").unwrap().canonical(), "2025-06-05");
        assert_eq!(res.resolve("yesterday").unwrap().canonical(), "2025-06-03");
    }

    #[test]
    fn test_resolve_now_keeps_time() {
        let res = ChronoResolver::at(noon());
        let r = res.resolve("now").unwrap();
        assert!(r.is_now);
        assert!(r.has_time);
        assert_eq!(r.dt, noon());
    }

    #[test]
    fn test_resolve_weekday_is_next_occurrence() {
        let res = ChronoResolver::at(noon());
        // From Wednesday: Friday is 2 days out, Wednesday wraps a full week
        assert_eq!(res.resolve("friday").unwrap().canonical(), "2025-06-06");
        assert_eq!(res.resolve("wed").unwrap().canonical(), "2025-06-11");
    }

    #[test]
    fn test_resolve_offsets() {
        let res = ChronoResolver::at(noon());
        assert_eq!(res.resolve("3d").unwrap().canonical(), "2025-06-07");
        assert_eq!(res.resolve("+2w").unwrap().canonical(), "2025-06-18");
        assert_eq!(res.resolve("-1d").unwrap().canonical(), "2025-06-03");
        assert_eq!(res.resolve("-12h").unwrap().canonical(), "2025-06-04 00:00");
    }

    #[test]
    fn test_resolve_unknown_phrase() {
        let res = ChronoResolver::at(noon());
        assert!(res.resolve("someday").is_none());
        assert!(res.resolve("5x").is_none());
    }
}
