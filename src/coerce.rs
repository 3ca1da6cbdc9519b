use once_cell::sync::Lazy;
use regex::Regex;

/// A raw scalar pulled from one cell of an uploaded table. Null-equivalent
/// cells are dropped during extraction and never reach this type.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Render the cell for places that need its textual form (URLs, dates).
    /// Integral numbers print without a trailing `.0` so an xlsx numeric cell
    /// reads the way the export displayed it.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 => {
                format!("{}", *n as i64)
            }
            CellValue::Number(n) => n.to_string(),
        }
    }
}

static FIRST_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+").expect("integer pattern"));

/// Placeholder tokens the exports use for "no value", compared case-insensitively.
const NO_VALUE_TOKENS: &[&str] = &["nan", "none", "n/a", "-", "—"];

/// Coerce an optional cell into an integer.
///
/// Total by design: the exports mix plain numbers, numbers with thousands
/// separators, and placeholder text, and a malformed metric should degrade to
/// 0 rather than sink the whole record.
pub fn coerce_int(value: Option<&CellValue>) -> i64 {
    match value {
        None => 0,
        Some(CellValue::Number(n)) => {
            if n.is_finite() {
                n.trunc() as i64
            } else {
                0
            }
        }
        Some(CellValue::Text(s)) => {
            let v = s.trim();
            if v.is_empty() || NO_VALUE_TOKENS.contains(&v.to_lowercase().as_str()) {
                return 0;
            }
            let v = v.replace(',', "");
            FIRST_INT
                .find(&v)
                .and_then(|m| m.as_str().parse::<i64>().ok())
                .unwrap_or(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.into())
    }

    #[test]
    fn strips_thousands_separators() {
        assert_eq!(coerce_int(Some(&text("1,234"))), 1234);
        assert_eq!(coerce_int(Some(&text("12,345,678"))), 12_345_678);
    }

    #[test]
    fn placeholder_tokens_coerce_to_zero() {
        for token in ["N/A", "nan", "NaN", "None", "-", "—", "", "   "] {
            assert_eq!(coerce_int(Some(&text(token))), 0, "token {token:?}");
        }
    }

    #[test]
    fn missing_is_zero() {
        assert_eq!(coerce_int(None), 0);
    }

    #[test]
    fn negative_values_survive() {
        assert_eq!(coerce_int(Some(&CellValue::Number(-5.0))), -5);
        assert_eq!(coerce_int(Some(&text("-5"))), -5);
    }

    #[test]
    fn numbers_truncate_toward_zero() {
        assert_eq!(coerce_int(Some(&CellValue::Number(3.9))), 3);
        assert_eq!(coerce_int(Some(&CellValue::Number(-3.9))), -3);
        assert_eq!(coerce_int(Some(&CellValue::Number(f64::NAN))), 0);
    }

    #[test]
    fn first_integer_substring_wins() {
        assert_eq!(coerce_int(Some(&text("  12 clicks (3 unique)"))), 12);
    }

    #[test]
    fn garbage_is_zero() {
        assert_eq!(coerce_int(Some(&text("no numbers here"))), 0);
    }

    #[test]
    fn integral_number_renders_without_fraction() {
        assert_eq!(CellValue::Number(314159.0).to_text(), "314159");
        assert_eq!(CellValue::Number(2.5).to_text(), "2.5");
    }
}
