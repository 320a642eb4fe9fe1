use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    pub static ref EMAIL_RX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    )
    .unwrap();
}

/// Accumulated validation errors for a single form submission.
///
/// Field errors keep every message in check order; a field that fails two
/// checks carries two messages.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Validator {
    pub field_errors: BTreeMap<String, Vec<String>>,
    pub non_field_errors: Vec<String>,
}

impl Validator {
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    pub fn add_field_error(&mut self, field: &str, message: &str) {
        self.field_errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_string());
    }

    pub fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_field_error(field, message);
        }
    }
}

/// Implemented by every form that carries its own error accumulator.
pub trait Validatable {
    fn validator(&self) -> &Validator;
    fn validator_mut(&mut self) -> &mut Validator;

    fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        self.validator_mut().check_field(ok, field, message);
    }

    fn add_non_field_error(&mut self, message: &str) {
        self.validator_mut().add_non_field_error(message);
    }

    fn valid(&self) -> bool {
        self.validator().valid()
    }

    fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.validator().field_errors
    }
}

pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Counts characters, not bytes.
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}
