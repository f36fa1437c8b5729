use std::fmt;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};

/// which structural constraint a field failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    NotEmpty,
    NotUnique,
    Format,
    MinValue,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::NotEmpty => write!(f, "not-empty"),
            Constraint::NotUnique => write!(f, "not-unique"),
            Constraint::Format => write!(f, "format"),
            Constraint::MinValue => write!(f, "min-value"),
        }
    }
}

/// a single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub constraint: Constraint,
    pub message: String,
}

impl Violation {
    pub fn new(field: &'static str, constraint: Constraint, message: impl Into<String>) -> Self {
        Violation {
            field,
            constraint,
            message: message.into(),
        }
    }
}

/// render violations for error messages: "field: message; field: message"
pub fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// fail with a validation error when any violation was collected
pub fn ensure_valid(violations: Vec<Violation>) -> Result<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::Validation { violations })
    }
}

/// registration payload
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        NewUser {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// structural rules only; email uniqueness is checked against the store
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        check_name(&mut violations, &self.name);
        check_email(&mut violations, &self.email);
        check_password(&mut violations, &self.password);
        violations
    }
}

/// profile update payload, only provided fields are validated and applied
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UserUpdate {
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        if let Some(name) = &self.name {
            check_name(&mut violations, name);
        }
        if let Some(email) = &self.email {
            check_email(&mut violations, email);
        }
        if let Some(password) = &self.password {
            check_password(&mut violations, password);
        }
        violations
    }
}

/// deposit amount rules: strictly positive and at least the configured minimum
pub fn validate_deposit(amount: Money, minimum: Money) -> Vec<Violation> {
    let mut violations = Vec::new();
    if !amount.is_positive() {
        violations.push(Violation::new(
            "amount",
            Constraint::MinValue,
            "amount must be a positive number",
        ));
    } else if amount < minimum {
        violations.push(Violation::new(
            "amount",
            Constraint::MinValue,
            format!("amount must be at least {minimum}"),
        ));
    }
    violations
}

fn check_name(violations: &mut Vec<Violation>, name: &str) {
    if name.trim().is_empty() {
        violations.push(Violation::new(
            "name",
            Constraint::NotEmpty,
            "name must not be empty",
        ));
    }
}

fn check_email(violations: &mut Vec<Violation>, email: &str) {
    if email.trim().is_empty() {
        violations.push(Violation::new(
            "email",
            Constraint::NotEmpty,
            "email must not be empty",
        ));
    } else if !well_formed_email(email) {
        violations.push(Violation::new(
            "email",
            Constraint::Format,
            "email must be a valid email",
        ));
    }
}

fn check_password(violations: &mut Vec<Violation>, password: &str) {
    if password.is_empty() {
        violations.push(Violation::new(
            "password",
            Constraint::NotEmpty,
            "password must not be empty",
        ));
    } else if password.chars().any(char::is_whitespace) {
        violations.push(Violation::new(
            "password",
            Constraint::Format,
            "password should not contain spaces",
        ));
    }
}

fn well_formed_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
