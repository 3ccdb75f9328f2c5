use std::collections::BTreeMap;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

/// A page context: the template that would render it plus its variables.
#[derive(Debug, Serialize)]
pub struct Rendered<T> {
    pub template: &'static str,
    #[serde(flatten)]
    pub context: T,
}

impl<T> Rendered<T> {
    pub fn new(template: &'static str, context: T) -> Self {
        Rendered { template, context }
    }
}

impl<T: Serialize> IntoResponse for Rendered<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorPage {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorPage {
    pub fn new(message: &str) -> Self {
        ErrorPage {
            message: message.to_string(),
            path: None,
        }
    }

    pub fn with_path(message: &str, path: &str) -> Self {
        ErrorPage {
            message: message.to_string(),
            path: Some(path.to_string()),
        }
    }
}

pub const NON_FIELD_ERRORS: &str = "__all__";

/// Field name to messages, the shape a form template iterates over.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut result = FormErrors::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                result.add(field, message);
            }
        }
        result
    }
}

/// Describes one input of a rendered form.
#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub kind: &'static str,
    pub required: bool,
}

impl FormField {
    pub const fn char_field(name: &'static str, required: bool) -> Self {
        FormField {
            name,
            kind: "CharField",
            required,
        }
    }
}
