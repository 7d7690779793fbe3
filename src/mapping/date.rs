use crate::errors::ExportError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How a profile turns the transaction-date column into a calendar date.
///
/// Bank exports disagree on date layout, so each profile picks one:
/// - `usSlash`: `MM/DD/YY` when the year part has two digits, `MM/DD/YYYY` otherwise
/// - `formats`: a list of chrono formats tried in order (e.g. `%d.%m.%Y`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DateParser {
    UsSlash,
    Formats { formats: Vec<String> },
}

impl DateParser {
    pub fn formats<I, S>(formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DateParser::Formats {
            formats: formats.into_iter().map(Into::into).collect(),
        }
    }

    pub fn parse(&self, value: &str) -> Result<NaiveDate, ExportError> {
        let s = value.trim();
        let invalid = || ExportError::InvalidDate(value.to_string());

        match self {
            DateParser::UsSlash => {
                let year_len = s.rsplit('/').next().map(str::len).unwrap_or(0);
                let format = if year_len == 2 { "%m/%d/%y" } else { "%m/%d/%Y" };
                NaiveDate::parse_from_str(s, format).map_err(|_| invalid())
            }
            DateParser::Formats { formats } => formats
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
                .ok_or_else(invalid),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ExportError> {
        match self {
            DateParser::Formats { formats } if formats.is_empty() => Err(
                ExportError::Configuration("date parser lists no formats".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use rstest::rstest;

    #[rstest]
    #[case("12/26/2025", 2025, 12, 26)]
    #[case("12/26/25", 2025, 12, 26)]
    #[case("1/2/2025", 2025, 1, 2)]
    #[case("  01/02/2025  ", 2025, 1, 2)]
    fn test_us_slash_valid(
        #[case] input: &str,
        #[case] year: i32,
        #[case] month: u32,
        #[case] day: u32,
    ) {
        let date = DateParser::UsSlash.parse(input).unwrap();
        assert_eq!(date.year(), year);
        assert_eq!(date.month(), month);
        assert_eq!(date.day(), day);
    }

    #[rstest]
    #[case("26/12/2025")]  // day first
    #[case("2025-12-26")]
    #[case("02/30/2025")]
    #[case("")]
    #[case("   ")]
    fn test_us_slash_invalid(#[case] input: &str) {
        let result = DateParser::UsSlash.parse(input);
        assert!(matches!(result, Err(ExportError::InvalidDate(_))));
    }

    #[test]
    fn test_formats_tried_in_order() {
        let parser = DateParser::formats(["%d.%m.%Y", "%Y-%m-%d"]);
        assert_eq!(
            parser.parse("31.12.2025").unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
        );
        assert_eq!(
            parser.parse("2025-01-05").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()
        );
        assert!(parser.parse("01/05/2025").is_err());
    }

    #[test]
    fn test_empty_format_list_is_a_configuration_error() {
        let parser = DateParser::formats(Vec::<String>::new());
        assert!(matches!(parser.validate(), Err(ExportError::Configuration(_))));
        assert!(DateParser::UsSlash.validate().is_ok());
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&DateParser::UsSlash).unwrap();
        assert_eq!(json, r#"{"kind":"usSlash"}"#);

        let parser: DateParser =
            serde_json::from_str(r#"{"kind":"formats","formats":["%d/%m/%Y"]}"#).unwrap();
        assert_eq!(parser, DateParser::formats(["%d/%m/%Y"]));
    }
}
