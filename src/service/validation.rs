//! Input rules for creating a user, applied before anything touches the store.
//!
//! Every rule runs; failures are collected rather than returned on the first
//! hit so callers can show all field problems at once.

use crate::db::models::{NewAddress, NewUser, Password, Role};
use crate::types::user::{CreateAddress, CreateUser};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

pub const NAME_MAX_CHARS: usize = 255;
pub const PASSWORD_MIN_CHARS: usize = 3;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9_'+\-]+(\.[A-Za-z0-9_'+\-]+)*@([A-Za-z0-9]([A-Za-z0-9\-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$",
    )
    .expect("email pattern must compile")
});

/// One failed rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Dotted field path, e.g. `firstName` or `address.city`.
    pub path: String,
    pub message: String,
}

/// Non-empty set of violations produced by a single validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationList(Vec<Violation>);

impl ViolationList {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|v| v.message.as_str())
    }

    pub fn for_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Violation> {
        self.0.iter().filter(move |v| v.path == path)
    }
}

impl fmt::Display for ViolationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for v in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", v.path, v.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ViolationList {}

#[derive(Default)]
struct Collector(Vec<Violation>);

impl Collector {
    fn push(&mut self, path: &str, message: impl Into<String>) {
        self.0.push(Violation {
            path: path.to_string(),
            message: message.into(),
        });
    }

    fn has(&self, path: &str) -> bool {
        self.0.iter().any(|v| v.path == path)
    }

    fn finish<T>(self, value: T) -> Result<T, ViolationList> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(ViolationList(self.0))
        }
    }
}

/// Validate a typed payload and normalize it into a [`NewUser`].
pub fn validate_create_user(input: &CreateUser) -> Result<NewUser, ViolationList> {
    let mut errs = Collector::default();
    let user = check_create_user(input, &mut errs);
    errs.finish(user)
}

/// Validate an untyped JSON payload. Wrong JSON types are reported per field
/// alongside the ordinary rule violations.
pub fn parse_create_user(value: &Value) -> Result<NewUser, ViolationList> {
    let mut errs = Collector::default();
    let Some(root) = value.as_object() else {
        errs.push("", format!("Expected object, received {}", json_type(value)));
        return errs.finish(NewUser::placeholder());
    };

    let address = match root.get("address") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(CreateAddress {
            street: string_field(map, "street", "address.street", &mut errs),
            city: string_field(map, "city", "address.city", &mut errs),
            province: string_field(map, "province", "address.province", &mut errs),
        }),
        Some(other) => {
            errs.push(
                "address",
                format!("Expected object, received {}", json_type(other)),
            );
            None
        }
    };

    let input = CreateUser {
        email: string_field(root, "email", "email", &mut errs),
        password: string_field(root, "password", "password", &mut errs),
        first_name: string_field(root, "firstName", "firstName", &mut errs),
        last_name: string_field(root, "lastName", "lastName", &mut errs),
        role: string_field(root, "role", "role", &mut errs),
        address,
    };
    let user = check_create_user(&input, &mut errs);
    errs.finish(user)
}

fn check_create_user(input: &CreateUser, errs: &mut Collector) -> NewUser {
    let email = match input.email.as_deref() {
        Some(email) if EMAIL_RE.is_match(email) => email.to_string(),
        Some(_) => {
            errs.push("email", "Invalid Email");
            String::new()
        }
        None => {
            required(errs, "email");
            String::new()
        }
    };

    let password = match input.password.as_deref() {
        Some(raw) if raw.chars().count() >= PASSWORD_MIN_CHARS => Password::new(raw),
        Some(_) => {
            errs.push(
                "password",
                format!("Minimum of {PASSWORD_MIN_CHARS} Characters"),
            );
            Password::new("")
        }
        None => {
            required(errs, "password");
            Password::new("")
        }
    };

    let first_name = check_name(input.first_name.as_deref(), "firstName", errs);
    let last_name = check_name(input.last_name.as_deref(), "lastName", errs);

    let role = match input.role.as_deref() {
        None => Role::default(),
        Some(raw) => raw.parse::<Role>().unwrap_or_else(|_| {
            errs.push(
                "role",
                "Invalid enum value. Expected 'ADMIN' | 'USER' | 'GUEST'",
            );
            Role::default()
        }),
    };

    let address = match input.address.as_ref() {
        Some(a) => NewAddress {
            street: a.street.clone().unwrap_or_default(),
            city: a.city.clone().unwrap_or_default(),
            province: a.province.clone().unwrap_or_default(),
        },
        None => {
            required(errs, "address");
            NewAddress::default()
        }
    };

    NewUser {
        email,
        password,
        first_name,
        last_name,
        role,
        address,
    }
}

fn check_name(raw: Option<&str>, path: &str, errs: &mut Collector) -> String {
    let Some(raw) = raw else {
        required(errs, path);
        return String::new();
    };
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len < 1 {
        errs.push(path, "Minimum of 1 Character");
    } else if len > NAME_MAX_CHARS {
        errs.push(path, format!("Maximum of {NAME_MAX_CHARS} Characters"));
    }
    trimmed.to_string()
}

fn required(errs: &mut Collector, path: &str) {
    // a type mismatch on the same field already explains the absence
    if !errs.has(path) {
        errs.push(path, "Required");
    }
}

fn string_field(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    errs: &mut Collector,
) -> Option<String> {
    match map.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errs.push(
                path,
                format!("Expected string, received {}", json_type(other)),
            );
            None
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl NewUser {
    fn placeholder() -> Self {
        NewUser {
            email: String::new(),
            password: Password::new(""),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::default(),
            address: NewAddress::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rizal() -> CreateUser {
        CreateUser::new(
            "j.rizal@lasolidaridad.org",
            "noli",
            "Jose",
            "Rizal",
            CreateAddress::new("Rizal Avenue", "Calamba", "Laguna"),
        )
    }

    #[test]
    fn accepts_valid_input_and_applies_defaults() {
        let mut input = rizal();
        input.first_name = Some("  Jose ".to_string());
        input.address = Some(CreateAddress {
            city: Some("Calamba".to_string()),
            ..CreateAddress::default()
        });

        let user = validate_create_user(&input).unwrap();
        assert_eq!(user.first_name, "Jose");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.address.street, "");
        assert_eq!(user.address.city, "Calamba");
        assert_eq!(user.address.province, "");
    }

    #[test]
    fn rejects_malformed_email() {
        let mut input = rizal();
        input.email = Some("not an email".to_string());

        let errs = validate_create_user(&input).unwrap_err();
        let messages: Vec<_> = errs.for_path("email").map(|v| v.message.as_str()).collect();
        assert_eq!(messages, vec!["Invalid Email"]);
    }

    #[test]
    fn reports_every_violation_not_just_the_first() {
        let mut input = rizal();
        input.email = Some("nope".to_string());
        input.first_name = Some(String::new());
        input.last_name = Some("   ".to_string());
        input.password = Some("ab".to_string());
        input.role = Some("ROOT".to_string());

        let errs = validate_create_user(&input).unwrap_err();
        let paths: Vec<_> = errs.violations().iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["email", "password", "firstName", "lastName", "role"]
        );
        assert!(errs.messages().any(|m| m == "Minimum of 1 Character"));
        assert!(errs.messages().any(|m| m == "Minimum of 3 Characters"));
    }

    #[test]
    fn enforces_name_ceiling_after_trim() {
        let mut input = rizal();
        input.last_name = Some(format!(" {} ", "x".repeat(NAME_MAX_CHARS)));
        assert!(validate_create_user(&input).is_ok());

        input.last_name = Some("x".repeat(NAME_MAX_CHARS + 1));
        let errs = validate_create_user(&input).unwrap_err();
        assert_eq!(
            errs.for_path("lastName").next().unwrap().message,
            "Maximum of 255 Characters"
        );
    }

    #[test]
    fn missing_fields_are_required() {
        let errs = validate_create_user(&CreateUser::default()).unwrap_err();
        let required: Vec<_> = errs
            .violations()
            .iter()
            .filter(|v| v.message == "Required")
            .map(|v| v.path.as_str())
            .collect();
        assert_eq!(
            required,
            vec!["email", "password", "firstName", "lastName", "address"]
        );
    }

    #[test]
    fn untyped_payload_reports_type_mismatches() {
        let payload = json!({
            "email": 42,
            "password": "secret",
            "firstName": "Jose",
            "lastName": "Rizal",
            "address": { "street": ["Rizal Avenue"] }
        });

        let errs = parse_create_user(&payload).unwrap_err();
        assert_eq!(errs.violations().len(), 2);
        assert_eq!(
            errs.for_path("email").next().unwrap().message,
            "Expected string, received number"
        );
        assert_eq!(
            errs.for_path("address.street").next().unwrap().message,
            "Expected string, received array"
        );
    }

    #[test]
    fn untyped_payload_matches_typed_rules() {
        let payload = json!({
            "email": "j.rizal@lasolidaridad.org",
            "password": "noli",
            "firstName": "Jose",
            "lastName": "Rizal",
            "role": "ADMIN",
            "address": {}
        });
        let user = parse_create_user(&payload).unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.address, NewAddress::default());

        assert!(parse_create_user(&json!("jose")).is_err());
    }

    #[test]
    fn display_lists_each_field() {
        let mut input = rizal();
        input.email = Some("x".to_string());
        input.first_name = Some(String::new());
        let errs = validate_create_user(&input).unwrap_err();
        assert_eq!(
            errs.to_string(),
            "email: Invalid Email; firstName: Minimum of 1 Character"
        );
    }
}
