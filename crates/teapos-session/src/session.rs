//! Session data structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Short-lived bearer credential sent on every authenticated request
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

/// Longer-lived credential, only ever exchanged for a new access token
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

macro_rules! token_impls {
    ($name:ident) => {
        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($name), "(<redacted>)"))
            }
        }
    };
}

token_impls!(AccessToken);
token_impls!(RefreshToken);

/// Client-side copy of the server's user identity.
///
/// Cached for display only; never used to make authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub fullname: String,
    pub whatsapp: String,
    pub role: String,
}

impl UserRecord {
    pub fn role_kind(&self) -> Result<UserRole, String> {
        self.role.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    SuperAdmin,
    Admin,
    User,
    Employee,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "superadmin",
            UserRole::Admin => "admin",
            UserRole::User => "user",
            UserRole::Employee => "employee",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "superadmin" => Ok(UserRole::SuperAdmin),
            "admin" => Ok(UserRole::Admin),
            "user" => Ok(UserRole::User),
            "employee" => Ok(UserRole::Employee),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that makes up "logged in": both tokens and the cached user
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub user: UserRecord,
}

impl Session {
    pub fn new(access_token: AccessToken, refresh_token: RefreshToken, user: UserRecord) -> Self {
        Self {
            access_token,
            refresh_token,
            user,
        }
    }
}

/// Login form payload
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration form payload
#[derive(Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub fullname: String,
    pub password: String,
    pub whatsapp: String,
    pub role: String,
}

impl Registration {
    /// New registration with the default `user` role
    pub fn new(
        username: impl Into<String>,
        fullname: impl Into<String>,
        password: impl Into<String>,
        whatsapp: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            fullname: fullname.into(),
            password: password.into(),
            whatsapp: whatsapp.into(),
            role: UserRole::User.as_str().to_string(),
        }
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role.as_str().to_string();
        self
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("fullname", &self.fullname)
            .field("password", &"<redacted>")
            .field("whatsapp", &self.whatsapp)
            .field("role", &self.role)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_do_not_leak_in_debug() {
        let token = AccessToken::new("secret-access");
        assert_eq!(format!("{:?}", token), "AccessToken(<redacted>)");
        assert_eq!(token.as_str(), "secret-access");

        let creds = Credentials::new("kasir", "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }

    #[test]
    fn test_role_parsing() {
        let mut user = UserRecord {
            id: 1,
            username: "kasir".to_string(),
            fullname: "Kasir Satu".to_string(),
            whatsapp: "628123".to_string(),
            role: "Employee".to_string(),
        };
        assert_eq!(user.role_kind(), Ok(UserRole::Employee));

        user.role = "owner".to_string();
        assert!(user.role_kind().is_err());
    }

    #[test]
    fn test_registration_serializes_wire_fields() {
        let registration =
            Registration::new("kasir", "Kasir Satu", "pw", "628123").with_role(UserRole::Admin);
        let value = serde_json::to_value(&registration).unwrap();

        assert_eq!(value["username"], "kasir");
        assert_eq!(value["fullname"], "Kasir Satu");
        assert_eq!(value["password"], "pw");
        assert_eq!(value["whatsapp"], "628123");
        assert_eq!(value["role"], "admin");
    }
}
