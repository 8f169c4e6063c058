//! Declarative field contracts for every catalog input.
//!
//! Each input type points at one of the rule tables below and exposes its
//! field values by name. [`validate`] walks the table in declaration order
//! and stops at the first violation, so callers always learn which field
//! failed and why before any row is touched.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// First failing field of an input, with a human readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Character classes that some text fields must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Username,
    Email,
}

impl Pattern {
    fn regex(self) -> &'static Regex {
        static USERNAME: OnceLock<Regex> = OnceLock::new();
        static EMAIL: OnceLock<Regex> = OnceLock::new();

        match self {
            Self::Username => USERNAME.get_or_init(|| {
                Regex::new(r"^[A-Za-z0-9_.-]+$").expect("Invalid regex pattern defined in code")
            }),
            Self::Email => EMAIL.get_or_init(|| {
                Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
                    .expect("Invalid regex pattern defined in code")
            }),
        }
    }

    const fn describe(self) -> &'static str {
        match self {
            Self::Username => "may only contain letters, digits, '.', '_' and '-'",
            Self::Email => "must be a valid email address",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    /// Trimmed length in characters.
    Length { min: usize, max: usize },
    /// Trimmed length plus a whole-value pattern.
    Matches {
        min: usize,
        max: usize,
        pattern: Pattern,
    },
    /// Trimmed length, and no control characters inside the trimmed value.
    PlainText { min: usize, max: usize },
    /// Inclusive integer range.
    Range { min: i64, max: i64 },
    /// Strictly positive, at most `max`.
    Positive { max: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRule {
    pub field: &'static str,
    pub required: bool,
    pub constraint: Constraint,
}

impl FieldRule {
    const fn required(field: &'static str, constraint: Constraint) -> Self {
        Self {
            field,
            required: true,
            constraint,
        }
    }

    const fn optional(field: &'static str, constraint: Constraint) -> Self {
        Self {
            field,
            required: false,
            constraint,
        }
    }
}

/// A field value as seen by the validator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    Integer(Option<i64>),
    Decimal(Option<f64>),
}

/// Implemented by every input that crosses into the store.
pub trait Validate {
    const RULES: &'static [FieldRule];

    /// Looks up the value of `field`; unknown names yield an empty text value.
    fn value(&self, field: &str) -> FieldValue<'_>;
}

pub const USER_RULES: &[FieldRule] = &[
    FieldRule::required(
        "username",
        Constraint::Matches {
            min: 3,
            max: 30,
            pattern: Pattern::Username,
        },
    ),
    FieldRule::required(
        "email",
        Constraint::Matches {
            min: 3,
            max: 254,
            pattern: Pattern::Email,
        },
    ),
    FieldRule::required("password_hash", Constraint::Length { min: 1, max: 1024 }),
];

pub const RECIPE_RULES: &[FieldRule] = &[
    FieldRule::required("title", Constraint::Length { min: 1, max: 200 }),
    FieldRule::optional("description", Constraint::Length { min: 0, max: 1000 }),
    FieldRule::required("instructions", Constraint::Length { min: 1, max: 10_000 }),
    FieldRule::required("prep_time", Constraint::Range { min: 0, max: 1440 }),
    FieldRule::required("cook_time", Constraint::Range { min: 0, max: 1440 }),
    FieldRule::required("servings", Constraint::Range { min: 1, max: 100 }),
    FieldRule::optional("serving_unit", Constraint::Length { min: 0, max: 20 }),
];

pub const INGREDIENT_RULES: &[FieldRule] = &[FieldRule::required(
    "name",
    Constraint::PlainText { min: 1, max: 100 },
)];

pub const TAG_RULES: &[FieldRule] = &[FieldRule::required(
    "name",
    Constraint::PlainText { min: 1, max: 50 },
)];

pub const INGREDIENT_LINK_RULES: &[FieldRule] = &[
    FieldRule::required("quantity", Constraint::Positive { max: 10_000.0 }),
    FieldRule::required("unit", Constraint::Length { min: 1, max: 20 }),
];

pub const IMAGE_RULES: &[FieldRule] = &[
    FieldRule::required("filename", Constraint::PlainText { min: 1, max: 255 }),
    FieldRule::optional("caption", Constraint::Length { min: 0, max: 200 }),
    FieldRule::required(
        "display_order",
        Constraint::Range {
            min: 0,
            max: i32::MAX as i64, // display_order column is INTEGER
        },
    ),
];

pub const SEARCH_RULES: &[FieldRule] = &[FieldRule::required(
    "query",
    Constraint::PlainText { min: 1, max: 100 },
)];

/// Checks `input` against its rule table, returning the first violation.
pub fn validate<T: Validate>(input: &T) -> Result<(), ValidationError> {
    for rule in T::RULES {
        check(rule, input.value(rule.field))?;
    }
    Ok(())
}

fn check(rule: &FieldRule, value: FieldValue<'_>) -> Result<(), ValidationError> {
    let field = rule.field;

    match (rule.constraint, value) {
        (Constraint::Length { min, max }, FieldValue::Text(text)) => {
            check_text(rule, text, min, max, |_| Ok(()))
        }
        (Constraint::Matches { min, max, pattern }, FieldValue::Text(text)) => {
            check_text(rule, text, min, max, |s| {
                if pattern.regex().is_match(s) {
                    Ok(())
                } else {
                    Err(ValidationError::new(field, pattern.describe()))
                }
            })
        }
        (Constraint::PlainText { min, max }, FieldValue::Text(text)) => {
            check_text(rule, text, min, max, |s| {
                if s.chars().any(char::is_control) {
                    Err(ValidationError::new(
                        field,
                        "must not contain control characters",
                    ))
                } else {
                    Ok(())
                }
            })
        }
        (Constraint::Range { min, max }, FieldValue::Integer(number)) => match number {
            None if rule.required => Err(ValidationError::new(field, "is required")),
            None => Ok(()),
            Some(n) if (min..=max).contains(&n) => Ok(()),
            Some(_) => Err(ValidationError::new(
                field,
                format!("must be between {min} and {max}"),
            )),
        },
        (Constraint::Positive { max }, FieldValue::Decimal(number)) => match number {
            None if rule.required => Err(ValidationError::new(field, "is required")),
            None => Ok(()),
            Some(n) if n.is_finite() && n > 0.0 && n <= max => Ok(()),
            Some(_) => Err(ValidationError::new(
                field,
                format!("must be greater than 0 and at most {max}"),
            )),
        },
        _ => Err(ValidationError::new(field, "has an unsupported value type")),
    }
}

fn check_text(
    rule: &FieldRule,
    text: Option<&str>,
    min: usize,
    max: usize,
    extra: impl FnOnce(&str) -> Result<(), ValidationError>,
) -> Result<(), ValidationError> {
    let trimmed = text.map(str::trim).unwrap_or_default();

    if trimmed.is_empty() {
        return if rule.required {
            Err(ValidationError::new(rule.field, "is required"))
        } else {
            Ok(())
        };
    }

    let len = trimmed.chars().count();
    if len < min || len > max {
        return Err(ValidationError::new(
            rule.field,
            format!("must be between {min} and {max} characters"),
        ));
    }

    extra(trimmed)
}

/// A raw search term, validated with [`SEARCH_RULES`].
#[derive(Debug, Clone, Copy)]
pub struct SearchQuery<'a>(pub &'a str);

impl SearchQuery<'_> {
    #[must_use]
    pub fn term(&self) -> &str {
        self.0.trim()
    }
}

impl Validate for SearchQuery<'_> {
    const RULES: &'static [FieldRule] = SEARCH_RULES;

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "query" => FieldValue::Text(Some(self.0)),
            _ => FieldValue::Text(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample<'a> {
        name: &'a str,
        amount: Option<i64>,
        weight: Option<f64>,
    }

    impl Validate for Sample<'_> {
        const RULES: &'static [FieldRule] = &[
            FieldRule::required("name", Constraint::PlainText { min: 2, max: 5 }),
            FieldRule::optional("amount", Constraint::Range { min: 1, max: 10 }),
            FieldRule::required("weight", Constraint::Positive { max: 100.0 }),
        ];

        fn value(&self, field: &str) -> FieldValue<'_> {
            match field {
                "name" => FieldValue::Text(Some(self.name)),
                "amount" => FieldValue::Integer(self.amount),
                "weight" => FieldValue::Decimal(self.weight),
                _ => FieldValue::Text(None),
            }
        }
    }

    fn sample(name: &str) -> Sample<'_> {
        Sample {
            name,
            amount: None,
            weight: Some(1.0),
        }
    }

    #[test]
    fn accepts_valid_input() {
        assert!(validate(&sample("abc")).is_ok());
    }

    #[test]
    fn reports_first_failing_field() {
        let input = Sample {
            name: "",
            amount: Some(99),
            weight: None,
        };
        let err = validate(&input).unwrap_err();
        assert_eq!(err.field, "name");
        assert_eq!(err.reason, "is required");
    }

    #[test]
    fn measures_length_in_characters_after_trimming() {
        assert!(validate(&sample("  ab  ")).is_ok());
        assert!(validate(&sample("ééééé")).is_ok());
        let err = validate(&sample("toolong")).unwrap_err();
        assert_eq!(err.reason, "must be between 2 and 5 characters");
    }

    #[test]
    fn rejects_control_characters() {
        let err = validate(&sample("a\u{7}b")).unwrap_err();
        assert_eq!(err.field, "name");
    }

    #[test]
    fn optional_integer_may_be_absent_but_not_out_of_range() {
        let mut input = sample("abc");
        assert!(validate(&input).is_ok());
        input.amount = Some(11);
        assert_eq!(validate(&input).unwrap_err().field, "amount");
    }

    #[test]
    fn decimal_must_be_strictly_positive() {
        let mut input = sample("abc");
        input.weight = Some(0.0);
        assert_eq!(validate(&input).unwrap_err().field, "weight");
        input.weight = Some(f64::NAN);
        assert_eq!(validate(&input).unwrap_err().field, "weight");
        input.weight = Some(100.0);
        assert!(validate(&input).is_ok());
    }

    #[test]
    fn search_query_rules() {
        assert!(validate(&SearchQuery("basil")).is_ok());
        assert!(validate(&SearchQuery("   ")).is_err());
        assert!(validate(&SearchQuery("tab\there")).is_err());
        assert!(validate(&SearchQuery(&"x".repeat(101))).is_err());
        assert_eq!(SearchQuery("  pizza ").term(), "pizza");
    }

    #[test]
    fn patterns_match_expected_shapes() {
        assert!(Pattern::Username.regex().is_match("chef_anna.b-1"));
        assert!(!Pattern::Username.regex().is_match("chef anna"));
        assert!(Pattern::Email.regex().is_match("anna@example.org"));
        assert!(!Pattern::Email.regex().is_match("anna@localhost"));
    }
}
