//! Values stored in a tree and the domain that admits them.
//!
//! A tree is created for exactly one [`ValueDomain`]. Every value handed to an
//! engine entry point is checked against that domain before any structural
//! work happens.

use std::fmt;
use std::str::FromStr;

use crate::tree::TreeError;

/// A single key stored in a tree.
///
/// Numeric values are whole numbers; lexical values are compared byte-wise.
/// A well-formed tree never mixes the two.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Number(i64),
    Text(String),
}

impl Value {
    /// The domain this value belongs to.
    #[must_use]
    pub const fn domain(&self) -> ValueDomain {
        match self {
            Self::Number(_) => ValueDomain::Numeric,
            Self::Text(_) => ValueDomain::Lexical,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Ordering domain of a tree's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueDomain {
    /// Signed whole numbers.
    Numeric,
    /// Non-empty strings.
    Lexical,
}

impl ValueDomain {
    /// Whether `value` belongs to this domain.
    #[must_use]
    pub const fn admits(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Numeric, Value::Number(_)) | (Self::Lexical, Value::Text(_))
        )
    }

    /// Parse raw user input into a value of this domain.
    ///
    /// Numeric input must be an optional `-` followed by ASCII digits and must
    /// fit in an `i64`. Lexical input must be non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidValue`] if the input does not belong to the
    /// domain.
    pub fn parse(self, input: &str) -> Result<Value, TreeError> {
        let invalid = || TreeError::InvalidValue {
            input: input.to_string(),
            domain: self,
        };

        match self {
            Self::Numeric => {
                let digits = input.strip_prefix('-').unwrap_or(input);
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                input.parse::<i64>().map(Value::Number).map_err(|_| invalid())
            }
            Self::Lexical => {
                if input.is_empty() {
                    return Err(invalid());
                }
                Ok(Value::Text(input.to_string()))
            }
        }
    }

    /// Short lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Numeric => "number",
            Self::Lexical => "text",
        }
    }
}

impl fmt::Display for ValueDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "number" | "numeric" => Ok(Self::Numeric),
            "text" | "string" | "lexical" => Ok(Self::Lexical),
            other => Err(format!("unknown value domain '{other}' (expected number or text)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric() {
        assert_eq!(ValueDomain::Numeric.parse("42"), Ok(Value::Number(42)));
        assert_eq!(ValueDomain::Numeric.parse("-7"), Ok(Value::Number(-7)));
        assert_eq!(ValueDomain::Numeric.parse("007"), Ok(Value::Number(7)));
    }

    #[test]
    fn test_parse_numeric_rejects_non_integers() {
        for input in ["", "-", "+5", "4.2", "abc", " 1", "1e3", "99999999999999999999"] {
            let err = ValueDomain::Numeric.parse(input);
            assert!(
                matches!(err, Err(TreeError::InvalidValue { .. })),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_lexical() {
        assert_eq!(
            ValueDomain::Lexical.parse("pear"),
            Ok(Value::Text("pear".to_string()))
        );
        assert!(ValueDomain::Lexical.parse("").is_err());
    }

    #[test]
    fn test_lexical_ordering_is_bytewise() {
        let mut values = vec![Value::from("b"), Value::from("B"), Value::from("aa")];
        values.sort();
        assert_eq!(values, vec![Value::from("B"), Value::from("aa"), Value::from("b")]);
    }

    #[test]
    fn test_admits() {
        assert!(ValueDomain::Numeric.admits(&Value::Number(1)));
        assert!(!ValueDomain::Numeric.admits(&Value::from("1")));
        assert!(ValueDomain::Lexical.admits(&Value::from("1")));
        assert_eq!(Value::Number(3).domain(), ValueDomain::Numeric);
    }

    #[test]
    fn test_domain_from_str() {
        assert_eq!("number".parse::<ValueDomain>(), Ok(ValueDomain::Numeric));
        assert_eq!("TEXT".parse::<ValueDomain>(), Ok(ValueDomain::Lexical));
        assert!("float".parse::<ValueDomain>().is_err());
    }
}
