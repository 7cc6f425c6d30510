use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

pub const BLANK: &str = "can't be blank";
pub const INVALID: &str = "is invalid";
pub const TAKEN: &str = "has already been taken";
pub const CONFIRMATION_MISMATCH: &str = "doesn't match password";

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub token_hash: String,
    pub created_at: OffsetDateTime,
}

/// A fully prepared row, ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub token_hash: String,
}

/// Raw creation input. Every field may be missing; [`Registration::validate`] decides.
#[derive(Clone, Default)]
pub struct Registration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub token: Option<String>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .finish_non_exhaustive()
    }
}

/// Output of a successful [`Registration::validate`].
#[derive(Clone)]
pub struct ValidRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub token: Option<String>,
}

impl fmt::Debug for ValidRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidRegistration").field("name", &self.name).field("email", &self.email).finish_non_exhaustive()
    }
}

impl Registration {
    /// Checks the field-level rules. Uniqueness is left to the store.
    ///
    /// # Errors
    /// Returns every violated rule, keyed by field.
    pub fn validate(self) -> Result<ValidRegistration, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = non_blank(self.name);
        if name.is_none() {
            errors.add("name", BLANK);
        }

        let email = non_blank(self.email);
        match &email {
            None => errors.add("email", BLANK),
            Some(e) if !looks_like_email(e) => errors.add("email", INVALID),
            Some(_) => {}
        }

        // Passwords are taken verbatim; only emptiness is rejected.
        let password = self.password.filter(|p| !p.is_empty());
        if password.is_none() {
            errors.add("password", BLANK);
        }

        if let (Some(password), Some(confirmation)) = (&password, &self.password_confirmation)
            && password != confirmation
        {
            errors.add("password_confirmation", CONFIRMATION_MISMATCH);
        }

        let token = non_blank(self.token);

        match (name, email, password) {
            (Some(name), Some(email), Some(password)) if errors.is_empty() => {
                Ok(ValidRegistration { name, email, password, token })
            }
            _ => Err(errors),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Field name to messages, serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    #[must_use]
    pub fn single(field: &'static str, message: &str) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: &str) {
        self.0.entry(field).or_default().push(message.to_string());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{field} {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}
