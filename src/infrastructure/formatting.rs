// Locale-aware number and date formatting for rendered widgets
use chrono::{DateTime, TimeZone};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ru,
    Uz,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unsupported locale: {0}")]
pub struct UnknownLocale(String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    /// Accepts a bare language tag or one with a region, e.g. "uz_UZ".
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let language = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match language.as_str() {
            "en" => Ok(Locale::En),
            "ru" => Ok(Locale::Ru),
            "uz" => Ok(Locale::Uz),
            _ => Err(UnknownLocale(tag.to_string())),
        }
    }
}

impl Locale {
    fn group_separator(self) -> char {
        match self {
            Locale::En => ',',
            Locale::Ru | Locale::Uz => '\u{a0}',
        }
    }

    fn date_pattern(self) -> &'static str {
        match self {
            Locale::En => "%b %-d, %Y, %H:%M:%S",
            Locale::Ru | Locale::Uz => "%d.%m.%Y %H:%M:%S",
        }
    }
}

/// Formats an integer with the locale's digit grouping.
pub fn format_number(value: i64, locale: Locale) -> String {
    let digits = value.unsigned_abs().to_string();
    let separator = locale.group_separator();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 * 2 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

pub fn format_date<Tz>(datetime: &DateTime<Tz>, locale: Locale) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    datetime.format(locale.date_pattern()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_format_number_grouping() {
        assert_eq!(format_number(0, Locale::En), "0");
        assert_eq!(format_number(999, Locale::En), "999");
        assert_eq!(format_number(1000, Locale::En), "1,000");
        assert_eq!(format_number(1234567, Locale::En), "1,234,567");
        assert_eq!(format_number(-1234567, Locale::En), "-1,234,567");
        assert_eq!(format_number(1234567, Locale::Uz), "1\u{a0}234\u{a0}567");
        assert_eq!(format_number(12345, Locale::Ru), "12\u{a0}345");
    }

    #[test]
    fn test_format_number_extremes() {
        assert_eq!(format_number(i64::MIN, Locale::En), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn test_format_date() {
        let datetime = Utc.with_ymd_and_hms(2026, 10, 16, 14, 5, 9).unwrap();
        assert_eq!(format_date(&datetime, Locale::En), "Oct 16, 2026, 14:05:09");
        assert_eq!(format_date(&datetime, Locale::Uz), "16.10.2026 14:05:09");

        let tashkent = FixedOffset::east_opt(5 * 3600).unwrap();
        let local = datetime.with_timezone(&tashkent);
        assert_eq!(format_date(&local, Locale::Ru), "16.10.2026 19:05:09");
    }

    #[test]
    fn test_parse_locale() {
        assert_eq!("en".parse(), Ok(Locale::En));
        assert_eq!("en-US".parse(), Ok(Locale::En));
        assert_eq!("uz_UZ".parse(), Ok(Locale::Uz));
        assert_eq!("RU".parse(), Ok(Locale::Ru));
        assert_eq!(
            "de".parse::<Locale>(),
            Err(UnknownLocale("de".to_string()))
        );
    }
}
