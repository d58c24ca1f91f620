use serde::Deserialize;
use std::fmt;

/// Untrusted create-user payload, as received from a caller.
///
/// Every field is optional so that a missing value is reported by
/// validation rather than rejected by the deserializer.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub address: Option<CreateAddress>,
}

/// Nested address fields; absent ones default to the empty string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAddress {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
}

impl CreateUser {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        address: CreateAddress,
    ) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            role: None,
            address: Some(address),
        }
    }
}

impl CreateAddress {
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        province: impl Into<String>,
    ) -> Self {
        Self {
            street: Some(street.into()),
            city: Some(city.into()),
            province: Some(province.into()),
        }
    }
}

impl fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUser")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("role", &self.role)
            .field("address", &self.address)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_with_missing_fields() {
        let input: CreateUser = serde_json::from_str(
            r#"{"email":"j.rizal@lasolidaridad.org","firstName":"Jose","address":{"city":"Calamba"}}"#,
        )
        .unwrap();
        assert_eq!(input.first_name.as_deref(), Some("Jose"));
        assert!(input.last_name.is_none());
        let address = input.address.unwrap();
        assert_eq!(address.city.as_deref(), Some("Calamba"));
        assert!(address.street.is_none());
    }

    #[test]
    fn debug_hides_password() {
        let input = CreateUser::new("a@b.co", "hunter2", "A", "B", CreateAddress::default());
        assert!(!format!("{input:?}").contains("hunter2"));
    }
}
