use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Integer part with optional `.` thousands groups, then an optional `,` decimal part.
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d{3})*(?:,\d+)?").expect("amount pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Currency {
    #[default]
    Unknown,
    Usd,
    Brl,
}

impl Currency {
    fn code(&self) -> &'static str {
        match self {
            Currency::Unknown => "",
            Currency::Usd => "USD",
            Currency::Brl => "BRL",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Extracts currency and amount from free text such as `"R$ 3.500,00"`.
///
/// The currency is detected independently of the amount; text without digits
/// yields `0.0`.
pub fn parse_salary(text: &str) -> (Currency, f64) {
    (detect_currency(text), parse_amount(text).unwrap_or(0.0))
}

/// True when `text` carries a number, including an explicit zero.
pub fn has_amount(text: &str) -> bool {
    AMOUNT_RE.is_match(text)
}

fn detect_currency(text: &str) -> Currency {
    if text.contains("R$") || text.contains("BRL") {
        Currency::Brl
    } else if text.contains('$') || text.contains("USD") {
        Currency::Usd
    } else {
        Currency::Unknown
    }
}

fn parse_amount(text: &str) -> Option<f64> {
    AMOUNT_RE
        .find(text)
        .and_then(|m| m.as_str().replace('.', "").replace(',', ".").parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brazilian_format() {
        assert_eq!(parse_salary("R$ 3.500,00"), (Currency::Brl, 3500.0));
        assert_eq!(parse_salary("BRL 12.000"), (Currency::Brl, 12000.0));
    }

    #[test]
    fn dollar_amounts() {
        assert_eq!(parse_salary("$50"), (Currency::Usd, 50.0));
        assert_eq!(parse_salary("USD 4500 / month"), (Currency::Usd, 4500.0));
    }

    #[test]
    fn empty_and_non_numeric() {
        assert_eq!(parse_salary(""), (Currency::Unknown, 0.0));
        assert_eq!(parse_salary("negotiable"), (Currency::Unknown, 0.0));
    }

    #[test]
    fn currency_without_amount() {
        assert_eq!(parse_salary("paid in USD"), (Currency::Usd, 0.0));
    }

    #[test]
    fn amount_without_currency() {
        assert_eq!(parse_salary("7.000,50 monthly"), (Currency::Unknown, 7000.5));
    }

    #[test]
    fn first_number_wins() {
        assert_eq!(parse_salary("R$ 4.000 - R$ 6.000"), (Currency::Brl, 4000.0));
    }

    #[test]
    fn zero_is_an_amount() {
        assert!(has_amount("$0"));
        assert!(has_amount("R$ 0,00"));
        assert!(!has_amount("negotiable"));
        assert!(!has_amount(""));
    }

    #[test]
    fn codes() {
        assert_eq!(Currency::Brl.to_string(), "BRL");
        assert_eq!(Currency::Unknown.to_string(), "");
    }
}
