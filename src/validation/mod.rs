// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request validation run before handlers.
//!
//! Each mutating endpoint declares a request type implementing
//! [`RequestSchema`]. Validation happens in two passes over the JSON body:
//!
//! 1. A shape pass driven by [`RequestSchema::FIELDS`] strips unknown keys,
//!    coerces numeric and boolean strings, and reports missing required
//!    fields, blank strings, wrong types and enum values outside the
//!    allowed set.
//! 2. The cleaned value is deserialized into the request type and checked
//!    with its `validator` rules (lengths, ranges, formats, custom rules).
//!
//! Violations from both passes are merged so the client sees every bad
//! field at once, each with its path, message and offending value.

pub mod rules;
pub mod schemas;

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::AppError;

/// One invalid field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    /// Dot-separated path, e.g. `preferences.dailyGoal`
    pub field: String,
    pub message: String,
    /// The value as received (after coercion), if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Every violation found in a request body.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub violations: Vec<FieldViolation>,
}

impl ValidationFailure {
    pub fn single(field: &str, message: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.to_string(),
                message: message.into(),
                value,
            }],
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

/// Expected JSON type of a declared field.
#[derive(Debug)]
pub enum FieldType {
    String,
    /// Any finite number; numeric strings are converted
    Number,
    /// Whole number; numeric strings and integral floats are converted
    Integer,
    /// `true`/`false`, also as strings
    Boolean,
    /// String restricted to a fixed set
    OneOf(&'static [&'static str]),
    Object(&'static [Field]),
    Array(&'static FieldType),
}

/// A declared request field.
#[derive(Debug)]
pub struct Field {
    /// Wire name (camelCase)
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
}

impl Field {
    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: false,
        }
    }
}

/// A request body contract.
///
/// Implementors derive `Deserialize` with `#[serde(default)]` so that a
/// body with missing or ill-typed fields still deserializes and the
/// remaining rules can be checked.
pub trait RequestSchema: DeserializeOwned + Validate {
    const FIELDS: &'static [Field];
}

/// Validate a raw JSON body against `T`.
pub fn validate_value<T: RequestSchema>(input: &Value) -> Result<T, ValidationFailure> {
    let mut violations = Vec::new();

    let cleaned = match input {
        Value::Object(map) => normalize_object(T::FIELDS, map, "", &mut violations),
        other => {
            return Err(ValidationFailure::single(
                "body",
                "Request body must be a JSON object",
                Some(other.clone()),
            ))
        }
    };

    let shaped: HashSet<String> = violations.iter().map(|v| v.field.clone()).collect();

    let parsed = match serde_json::from_value::<T>(Value::Object(cleaned.clone())) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Normalized body failed to deserialize");
            violations.push(FieldViolation {
                field: "body".to_string(),
                message: "Request body does not match the expected shape".to_string(),
                value: None,
            });
            return Err(ValidationFailure { violations });
        }
    };

    if let Err(errors) = parsed.validate() {
        let cleaned = Value::Object(cleaned);
        let mut rule_violations = Vec::new();
        flatten_errors(&errors, "", &cleaned, &mut rule_violations);
        rule_violations.retain(|v| !shaped.contains(&v.field));
        rule_violations.sort_by(|a, b| a.field.cmp(&b.field));
        // First failing rule per field wins.
        rule_violations.dedup_by(|a, b| a.field == b.field);
        violations.extend(rule_violations);
    }

    if violations.is_empty() {
        Ok(parsed)
    } else {
        Err(ValidationFailure { violations })
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn normalize_object(
    fields: &[Field],
    input: &Map<String, Value>,
    prefix: &str,
    violations: &mut Vec<FieldViolation>,
) -> Map<String, Value> {
    let mut out = Map::new();

    for field in fields {
        let path = join_path(prefix, field.name);
        match input.get(field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    violations.push(FieldViolation {
                        message: format!("{} is required", path),
                        field: path,
                        value: None,
                    });
                }
            }
            Some(raw) => {
                if let Some(value) = coerce(&field.ty, raw, &path, violations) {
                    out.insert(field.name.to_string(), value);
                }
            }
        }
    }

    out
}

/// Convert `raw` to `ty`, recording a violation and returning `None` when
/// it cannot be.
fn coerce(
    ty: &FieldType,
    raw: &Value,
    path: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<Value> {
    match ty {
        FieldType::String => match raw {
            Value::String(s) if s.trim().is_empty() => {
                reject(violations, path, raw, "is not allowed to be empty")
            }
            Value::String(_) => Some(raw.clone()),
            _ => reject(violations, path, raw, "must be a string"),
        },
        FieldType::Number => match raw {
            Value::Number(n) if n.as_f64().is_some_and(f64::is_finite) => Some(raw.clone()),
            _ => match as_f64(raw).and_then(Number::from_f64) {
                Some(n) => Some(Value::Number(n)),
                None => reject(violations, path, raw, "must be a number"),
            },
        },
        FieldType::Integer => match as_f64(raw) {
            Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some(Value::Number(Number::from(f as i64)))
            }
            _ => reject(violations, path, raw, "must be an integer"),
        },
        FieldType::Boolean => match raw {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::String(s) if s.trim() == "true" => Some(Value::Bool(true)),
            Value::String(s) if s.trim() == "false" => Some(Value::Bool(false)),
            _ => reject(violations, path, raw, "must be a boolean"),
        },
        FieldType::OneOf(allowed) => match raw {
            Value::String(s) if allowed.contains(&s.as_str()) => Some(raw.clone()),
            _ => reject(
                violations,
                path,
                raw,
                &format!("must be one of: {}", allowed.join(", ")),
            ),
        },
        FieldType::Object(fields) => match raw {
            Value::Object(map) => Some(Value::Object(normalize_object(
                fields, map, path, violations,
            ))),
            _ => reject(violations, path, raw, "must be an object"),
        },
        FieldType::Array(item) => match raw {
            Value::Array(items) => {
                let before = violations.len();
                let out: Vec<Value> = items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, element)| {
                        coerce(item, element, &join_path(path, &i.to_string()), violations)
                    })
                    .collect();
                (violations.len() == before).then_some(Value::Array(out))
            }
            _ => reject(violations, path, raw, "must be an array"),
        },
    }
}

fn reject(
    violations: &mut Vec<FieldViolation>,
    path: &str,
    raw: &Value,
    problem: &str,
) -> Option<Value> {
    violations.push(FieldViolation {
        field: path.to_string(),
        message: format!("{} {}", path, problem),
        value: Some(raw.clone()),
    });
    None
}

fn as_f64(raw: &Value) -> Option<f64> {
    let f = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

/// `daily_goal` -> `dailyGoal`
fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn flatten_errors(
    errors: &ValidationErrors,
    prefix: &str,
    root: &Value,
    out: &mut Vec<FieldViolation>,
) {
    for (name, kind) in errors.errors() {
        let path = if name.as_ref() == "__all__" {
            prefix.to_string()
        } else {
            join_path(prefix, &camel_case(name))
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    // Struct-level rules name the field they blame.
                    let path = match err.params.get("field").and_then(Value::as_str) {
                        Some(field) => join_path(prefix, field),
                        None => path.clone(),
                    };
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", path));
                    out.push(FieldViolation {
                        value: lookup(root, &path).cloned(),
                        field: path,
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten_errors(nested, &path, root, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_errors(nested, &join_path(&path, &index.to_string()), root, out);
                }
            }
        }
    }
}

/// Extractor that validates the JSON body as `T` before the handler runs.
///
/// Rejections are [`AppError::Validation`], rendered as a 400 listing every
/// violation.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: RequestSchema,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(req, state).await.map_err(|rejection| {
            AppError::Validation(ValidationFailure::single(
                "body",
                rejection.body_text(),
                None,
            ))
        })?;

        validate_value::<T>(&body)
            .map(Valid)
            .map_err(AppError::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, Validate)]
    #[serde(default, rename_all = "camelCase")]
    struct Sample {
        #[validate(length(min = 2, message = "label too short"))]
        label: String,
        #[validate(range(min = 0.0, max = 100.0, message = "score out of range"))]
        score: f64,
        flag: Option<bool>,
        #[validate(nested)]
        inner: Option<Inner>,
    }

    #[derive(Debug, Default, Deserialize, Validate)]
    #[serde(default, rename_all = "camelCase")]
    struct Inner {
        #[validate(range(min = 1, max = 10, message = "count out of range"))]
        max_count: Option<i64>,
    }

    const INNER_FIELDS: &[Field] = &[Field::optional("maxCount", FieldType::Integer)];

    impl RequestSchema for Sample {
        const FIELDS: &'static [Field] = &[
            Field::required("label", FieldType::String),
            Field::required("score", FieldType::Number),
            Field::optional("flag", FieldType::Boolean),
            Field::optional("inner", FieldType::Object(INNER_FIELDS)),
        ];
    }

    #[test]
    fn test_coercion_happens_before_bounds() {
        let sample: Sample =
            validate_value(&json!({"label": "ok", "score": "42", "flag": "true"})).unwrap();
        assert_eq!(sample.label, "ok");
        assert_eq!(sample.score, 42.0);
        assert_eq!(sample.flag, Some(true));

        let failure =
            validate_value::<Sample>(&json!({"label": "ok", "score": "142"})).unwrap_err();
        assert_eq!(failure.violations.len(), 1);
        assert_eq!(failure.violations[0].field, "score");
        assert_eq!(failure.violations[0].value, Some(json!(142.0)));
    }

    #[test]
    fn test_unknown_fields_are_stripped() {
        let sample: Sample = validate_value(&json!({
            "label": "ok",
            "score": 1,
            "isAdmin": true,
            "inner": {"maxCount": 3, "sneaky": 1}
        }))
        .unwrap();
        assert_eq!(sample.inner.unwrap().max_count, Some(3));
    }

    #[test]
    fn test_every_violation_reported() {
        let failure = validate_value::<Sample>(&json!({
            "label": "x",
            "score": "lots",
            "flag": 7,
            "inner": {"maxCount": 11}
        }))
        .unwrap_err();

        let fields: Vec<_> = failure.violations.iter().map(|v| v.field.as_str()).collect();
        assert!(fields.contains(&"label"));
        assert!(fields.contains(&"score"));
        assert!(fields.contains(&"flag"));
        assert!(fields.contains(&"inner.maxCount"));
        // One message per bad field, even when a type error hides the range rule.
        assert_eq!(failure.violations.len(), 4);

        let score = failure.violations.iter().find(|v| v.field == "score").unwrap();
        assert_eq!(score.message, "score must be a number");
        assert_eq!(score.value, Some(json!("lots")));
    }

    #[test]
    fn test_missing_required_fields() {
        let failure = validate_value::<Sample>(&json!({})).unwrap_err();
        assert!(failure.has_field("label"));
        assert!(failure.has_field("score"));
        assert_eq!(failure.violations.len(), 2);
        assert!(failure.violations.iter().all(|v| v.value.is_none()));
    }

    #[test]
    fn test_blank_string_rejected() {
        let failure = validate_value::<Sample>(&json!({"label": "   ", "score": 5})).unwrap_err();
        assert_eq!(failure.violations.len(), 1);
        assert_eq!(failure.violations[0].message, "label is not allowed to be empty");
        assert_eq!(failure.violations[0].value, Some(json!("   ")));
    }

    #[test]
    fn test_non_object_body() {
        let failure = validate_value::<Sample>(&json!([1, 2, 3])).unwrap_err();
        assert!(failure.has_field("body"));
    }

    #[test]
    fn test_integer_rejects_fraction() {
        let failure = validate_value::<Sample>(&json!({
            "label": "ok",
            "score": 1,
            "inner": {"maxCount": 2.5}
        }))
        .unwrap_err();
        assert_eq!(failure.violations[0].field, "inner.maxCount");
        assert_eq!(failure.violations[0].message, "inner.maxCount must be an integer");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("daily_goal"), "dailyGoal");
        assert_eq!(camel_case("score"), "score");
        assert_eq!(camel_case("words_in_correct"), "wordsInCorrect");
    }
}
