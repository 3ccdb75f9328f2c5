use axum::extract::Multipart;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{csrf::CSRF_FIELD, errors::RequestError};

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some("This field is required.".into());
        return Err(error);
    }
    Ok(())
}

// ----------------- Post Request -----------------

/// Create/edit form as submitted. The image is kept as raw bytes until the
/// rest of the form is known to be valid.
#[derive(Debug, Default, Validate)]
pub struct PostForm {
    #[validate(custom = "not_blank")]
    pub text: String,
    pub group: Option<String>,
    pub image: Option<Vec<u8>>,
    pub csrf_token: Option<String>,
}

impl PostForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<PostForm, RequestError> {
        let mut form = PostForm::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            tracing::debug!(error = %e, "malformed multipart body");
            RequestError::BadRequest("Malformed form data")
        })? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "text" => form.text = read_text(field).await?,
                "group" => {
                    let group = read_text(field).await?;
                    form.group = (!group.trim().is_empty()).then_some(group);
                }
                "image" => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|_| RequestError::BadRequest("Malformed form data"))?;
                    // browsers send an empty part when no file was chosen
                    form.image = (!bytes.is_empty()).then(|| bytes.to_vec());
                }
                CSRF_FIELD => form.csrf_token = Some(read_text(field).await?),
                _ => {}
            }
        }
        Ok(form)
    }

    /// `None` for "no group", `Err` for anything that is not an id.
    pub fn group_id(&self) -> Result<Option<i64>, ()> {
        match &self.group {
            None => Ok(None),
            Some(raw) => raw.trim().parse().map(Some).map_err(|_| ()),
        }
    }
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, RequestError> {
    field
        .text()
        .await
        .map_err(|_| RequestError::BadRequest("Malformed form data"))
}

// ----------------- Comment Request -----------------

#[derive(Deserialize, Serialize, Debug, Default, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub text: String,
    #[serde(default)]
    pub csrfmiddlewaretoken: Option<String>,
}

// ----------------- User Request -----------------

#[derive(Deserialize, Serialize, Debug, Default, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub username: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default, Validate)]
#[validate(schema(function = "passwords_match", skip_on_field_errors = false))]
pub struct SignupForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    #[validate(custom = "not_blank", length(max = 150))]
    pub username: String,
    #[serde(default)]
    #[validate(custom = "optional_email")]
    pub email: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub password1: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub password2: String,
}

fn optional_email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || validator::validate_email(value) {
        return Ok(());
    }
    let mut error = ValidationError::new("email");
    error.message = Some("Enter a valid email address.".into());
    Err(error)
}

fn passwords_match(form: &SignupForm) -> Result<(), ValidationError> {
    if form.password1 != form.password2 {
        let mut error = ValidationError::new("password_mismatch");
        error.message = Some("The two password fields didn't match.".into());
        return Err(error);
    }
    Ok(())
}
