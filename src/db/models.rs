use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Access level stored in `users.role`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    #[default]
    User,
    Guest,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::User, Role::Guest];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Guest => "GUEST",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role `{s}`"))
    }
}

/// Plain-text password that never shows up in logs, `Debug` output or JSON.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    const REDACTED: &'static str = "[redacted]";

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw value, only for binding into the insert statement.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password({})", Self::REDACTED)
    }
}

impl Serialize for Password {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(Self::REDACTED)
    }
}

/// A row of the `address` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Address {
    pub id: i64,
    pub street: String,
    pub city: String,
    pub province: String,
}

/// Address fields for an insert; the id is generated by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
    pub street: String,
    pub city: String,
    pub province: String,
}

/// Validated user aggregate ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub password: Password,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub address: NewAddress,
}

/// Caller-facing user shape: no password, address resolved in place of the
/// raw `address_id` foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub address: Address,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_redacted_everywhere() {
        let user = NewUser {
            email: "a@b.co".to_string(),
            password: Password::new("hunter2"),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            role: Role::default(),
            address: NewAddress::default(),
        };
        let debug = format!("{user:?}");
        let json = serde_json::to_string(&user).unwrap();
        assert!(!debug.contains("hunter2"));
        assert!(!json.contains("hunter2"));
        assert!(json.contains(r#""firstName":"A""#));
        assert_eq!(user.password.expose(), "hunter2");
    }

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!(Role::default(), Role::User);
        assert_eq!("GUEST".parse::<Role>(), Ok(Role::Guest));
        assert!("guest".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""ADMIN""#);
    }
}
