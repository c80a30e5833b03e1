//! Pure validation of the workspace form.
//!
//! Every rule runs on every call so all violations surface together. The
//! messages are rendered verbatim next to the offending field, so their
//! wording is part of the contract.

use std::collections::BTreeSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::model::{use_cases, Workspace};

pub const MAX_NAME_LENGTH: usize = 40;
pub const MAX_DESCRIPTION_LENGTH: usize = 200;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-zA-Z()_\[\]\-\s]+$").expect("valid name pattern"));

static COLOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid color pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    Description,
    Color,
    UseCase,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Description => "description",
            FormField::Color => "color",
            FormField::UseCase => "features",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationError {
    NameRequired,
    NameInvalid,
    NameTooLong,
    DescriptionTooLong,
    ColorInvalid,
    UseCaseRequired,
    UseCaseConflict,
}

impl ValidationError {
    pub const ALL: [ValidationError; 7] = [
        ValidationError::NameRequired,
        ValidationError::NameInvalid,
        ValidationError::NameTooLong,
        ValidationError::DescriptionTooLong,
        ValidationError::ColorInvalid,
        ValidationError::UseCaseRequired,
        ValidationError::UseCaseConflict,
    ];

    /// Reverse of [`ValidationError::message`]; clients use it to decode
    /// the per-field messages of a 422 body.
    pub fn from_message(message: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.message() == message)
    }

    pub fn field(&self) -> FormField {
        match self {
            ValidationError::NameRequired
            | ValidationError::NameInvalid
            | ValidationError::NameTooLong => FormField::Name,
            ValidationError::DescriptionTooLong => FormField::Description,
            ValidationError::ColorInvalid => FormField::Color,
            ValidationError::UseCaseRequired | ValidationError::UseCaseConflict => FormField::UseCase,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::NameRequired => "Name is required. Enter a name.",
            ValidationError::NameInvalid => "Name is invalid. Enter a valid name.",
            ValidationError::NameTooLong => "Name is too long. Enter a shorter name.",
            ValidationError::DescriptionTooLong => "Description is too long. Enter a shorter description.",
            ValidationError::ColorInvalid => "Color is invalid. Enter a valid color.",
            ValidationError::UseCaseRequired => "Use case is required. Select a use case.",
            ValidationError::UseCaseConflict => "Only one use case can be selected.",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Fields the update form edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceForm {
    pub name: String,
    pub description: String,
    pub color: Option<String>,
    pub features: BTreeSet<String>,
}

impl From<&Workspace> for WorkspaceForm {
    fn from(ws: &Workspace) -> Self {
        Self {
            name: ws.name.clone(),
            description: ws.description.clone(),
            color: ws.color.clone(),
            features: ws.features.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub violations: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has(&self, error: ValidationError) -> bool {
        self.violations.contains(&error)
    }

    pub fn messages(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.message()).collect()
    }

    pub fn for_field(&self, field: FormField) -> impl Iterator<Item = &ValidationError> {
        self.violations.iter().filter(move |v| v.field() == field)
    }

    /// `{"name": ["..."], "features": ["..."]}`
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for v in &self.violations {
            let entry = map
                .entry(v.field().as_str().to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(list) = entry {
                list.push(Value::String(v.message().to_string()));
            }
        }
        Value::Object(map)
    }

    pub fn into_result(self) -> Result<(), Vec<ValidationError>> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(self.violations)
        }
    }
}

pub fn validate_name(name: &str) -> Option<ValidationError> {
    if name.trim().is_empty() {
        return Some(ValidationError::NameRequired);
    }
    if !NAME_PATTERN.is_match(name) {
        return Some(ValidationError::NameInvalid);
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Some(ValidationError::NameTooLong);
    }
    None
}

pub fn validate_color(color: Option<&str>) -> Option<ValidationError> {
    match color {
        Some(c) if !COLOR_PATTERN.is_match(c) => Some(ValidationError::ColorInvalid),
        _ => None,
    }
}

pub fn validate_use_cases(features: &BTreeSet<String>) -> Option<ValidationError> {
    match use_cases(features).count() {
        0 => Some(ValidationError::UseCaseRequired),
        1 => None,
        _ => Some(ValidationError::UseCaseConflict),
    }
}

pub fn validate(form: &WorkspaceForm) -> ValidationReport {
    let mut violations = Vec::new();

    violations.extend(validate_name(&form.name));
    if form.description.chars().count() > MAX_DESCRIPTION_LENGTH {
        violations.push(ValidationError::DescriptionTooLong);
    }
    violations.extend(validate_color(form.color.as_deref()));
    violations.extend(validate_use_cases(&form.features));

    ValidationReport { violations }
}
