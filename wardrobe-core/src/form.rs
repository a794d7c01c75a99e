//! Declarative, rule-driven form validation.
//!
//! Rules are plain data interpreted by [`validate_value`]; [`FormState`] tracks
//! values, per-field touched state and the submitted flag for one open form.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const URL_MESSAGE: &str = "Please enter a valid URL.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Url,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    #[serde(default)]
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    #[serde(alias = "type")]
    pub kind: Option<RuleKind>,
}

impl ValidationRule {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn url(mut self) -> Self {
        self.kind = Some(RuleKind::Url);
        self
    }
}

/// Error message for `value` under `rule`; empty when valid.
///
/// Checks run in a fixed order and the first failure wins: required, minimum
/// length, maximum length, URL. Lengths count characters after trimming; a
/// length limit of zero counts as unset.
pub fn validate_value(value: Option<&str>, rule: &ValidationRule) -> String {
    let trimmed_len = value.map(|v| v.trim().chars().count());

    if rule.required && trimmed_len.unwrap_or(0) == 0 {
        return REQUIRED_MESSAGE.to_string();
    }

    if let Some(min) = rule.min_length.filter(|&n| n > 0) {
        if trimmed_len.is_none_or(|len| len < min) {
            return format!("Must be at least {min} characters.");
        }
    }

    if let Some(max) = rule.max_length.filter(|&n| n > 0) {
        if trimmed_len.is_none_or(|len| len > max) {
            return format!("Must be at most {max} characters.");
        }
    }

    if rule.kind == Some(RuleKind::Url) && !is_absolute_url(value.unwrap_or_default()) {
        return URL_MESSAGE.to_string();
    }

    String::new()
}

fn is_absolute_url(value: &str) -> bool {
    !value.is_empty() && url::Url::parse(value).is_ok()
}

/// Result of a full-form validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValidation {
    pub valid: bool,
    pub errors: HashMap<String, String>,
}

/// State of one open form instance.
#[derive(Debug, Clone)]
pub struct FormState {
    fields: Vec<String>,
    defaults: HashMap<String, String>,
    rules: HashMap<String, ValidationRule>,
    values: HashMap<String, String>,
    errors: HashMap<String, String>,
    touched: HashMap<String, bool>,
    submitted: bool,
    valid: bool,
}

impl FormState {
    /// `fields` lists `(name, default)` pairs in declaration order.
    pub fn new<N, V>(
        fields: impl IntoIterator<Item = (N, V)>,
        rules: impl IntoIterator<Item = (N, ValidationRule)>,
    ) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        let mut names = Vec::new();
        let mut defaults = HashMap::new();
        for (name, default) in fields {
            let name = name.into();
            if defaults.insert(name.clone(), default.into()).is_none() {
                names.push(name);
            }
        }

        let rules = rules.into_iter().map(|(name, rule)| (name.into(), rule)).collect();

        Self {
            fields: names,
            values: defaults.clone(),
            defaults,
            rules,
            errors: HashMap::new(),
            touched: HashMap::new(),
            submitted: false,
            valid: false,
        }
    }

    pub fn on_field_change(&mut self, name: &str, value: impl Into<String>) {
        if !self.is_known_field(name) {
            return;
        }
        self.values.insert(name.to_string(), value.into());
        self.touch_and_validate(name);
    }

    pub fn on_field_blur(&mut self, name: &str) {
        if !self.is_known_field(name) {
            return;
        }
        self.touch_and_validate(name);
    }

    /// Mark the form submitted and validate every rule-governed field.
    pub fn validate_form(&mut self) -> FormValidation {
        self.submitted = true;

        let errors: HashMap<String, String> = self
            .rules
            .iter()
            .map(|(name, rule)| {
                let value = self.values.get(name).map(String::as_str);
                (name.clone(), validate_value(value, rule))
            })
            .collect();

        self.errors = errors;
        self.recompute_validity();

        FormValidation {
            valid: self.valid,
            errors: self.errors.clone(),
        }
    }

    /// Restore defaults and forget all interaction state.
    pub fn reset_form(&mut self) {
        self.values = self.defaults.clone();
        self.errors.clear();
        self.touched.clear();
        self.submitted = false;
        self.valid = false;
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    pub fn error(&self, name: &str) -> &str {
        self.errors.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn errors(&self) -> &HashMap<String, String> {
        &self.errors
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.touched.get(name).copied().unwrap_or(false)
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> &[String] {
        &self.fields
    }

    /// Whether the error for `name` should be visible to the user.
    pub fn should_show_error(&self, name: &str) -> bool {
        (self.is_touched(name) || self.submitted) && !self.error(name).is_empty()
    }

    /// First field, in declaration order, with a non-empty error in `errors`.
    pub fn first_invalid_field(&self, errors: &HashMap<String, String>) -> Option<&str> {
        self.fields
            .iter()
            .find(|name| errors.get(*name).is_some_and(|e| !e.is_empty()))
            .map(String::as_str)
    }

    fn is_known_field(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        let known = self.defaults.contains_key(name);
        if !known {
            tracing::debug!("Ignoring event for unknown form field '{}'", name);
        }
        known
    }

    fn touch_and_validate(&mut self, name: &str) {
        self.touched.insert(name.to_string(), true);

        let error = match self.rules.get(name) {
            Some(rule) => validate_value(self.value(name), rule),
            None => String::new(),
        };
        self.errors.insert(name.to_string(), error);
        self.recompute_validity();
    }

    fn recompute_validity(&mut self) {
        self.valid = self.errors.values().all(|e| e.is_empty());
    }
}
