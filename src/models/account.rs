//! Account domain models

use crate::auth::{error::AuthError, role::Role};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Ten-digit mobile number
pub static MOBILE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}$").unwrap());

/// Personal details shown on a user's record.
///
/// Authentication never reads these. Every field is optional so staff
/// accounts carry an empty profile. Legacy field names (`DOB`, `cast`,
/// `Father_Number`) are accepted on input.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, sqlx::FromRow,
)]
#[serde(default)]
pub struct UserProfile {
    #[validate(range(min = 1, max = 120, message = "Age must be between 1 and 120"))]
    pub age: Option<i32>,
    #[serde(alias = "DOB")]
    pub dob: Option<NaiveDate>,
    #[serde(alias = "cast")]
    #[validate(length(max = 100))]
    pub user_cast: Option<String>,
    #[serde(alias = "Father_Number", alias = "father_number")]
    #[validate(regex(path = *MOBILE_REGEX, message = "Father's number must be 10 digits"))]
    pub father_mobile: Option<String>,
    #[validate(length(max = 100))]
    pub native_place: Option<String>,
    #[validate(length(max = 100))]
    pub current_place: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    pub marital_status: Option<bool>,
    #[validate(length(max = 100))]
    pub occupation: Option<String>,
    #[validate(length(max = 100))]
    pub education: Option<String>,
}

impl UserProfile {
    /// Trim text fields, dropping the ones left empty
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            user_cast: clean(self.user_cast),
            father_mobile: clean(self.father_mobile),
            native_place: clean(self.native_place),
            current_place: clean(self.current_place),
            address: clean(self.address),
            occupation: clean(self.occupation),
            education: clean(self.education),
            ..self
        }
    }
}

/// Row as stored; `role` is parsed into [`Role`] on the way out
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub role: String,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub password_hash: String,
    #[sqlx(flatten)]
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity with its credential hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub password_hash: String,
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AuthError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            role: row.role.parse()?,
            name: row.name,
            email: row.email,
            mobile: row.mobile,
            password_hash: row.password_hash,
            profile: row.profile,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Account to insert; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub role: Role,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub password_hash: String,
    pub profile: UserProfile,
}

/// Register admin request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterAdminRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: Secret<String>,
}

/// Register user request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(regex(path = *MOBILE_REGEX, message = "Mobile number must be 10 digits"))]
    pub mobile: String,
    pub password: Secret<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: UserProfile,
}

/// Update account request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(regex(path = *MOBILE_REGEX, message = "Mobile number must be 10 digits"))]
    pub mobile: Option<String>,
    /// Replaces the stored profile as a whole
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: UserProfile,
}

/// Account response (without sensitive data)
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            role: account.role,
            name: account.name,
            email: account.email,
            mobile: account.mobile,
            profile: account.profile,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_with_unknown_role_is_rejected() {
        let row = AccountRow {
            id: Uuid::new_v4(),
            role: "janitor".to_string(),
            name: "n".to_string(),
            email: "n@example.com".to_string(),
            mobile: None,
            password_hash: "$argon2id$...".to_string(),
            profile: UserProfile::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(Account::try_from(row).is_err());
    }

    #[test]
    fn test_register_user_validation() {
        let valid: RegisterUserRequest = serde_json::from_value(serde_json::json!({
            "name": "Asha",
            "email": "asha@example.com",
            "mobile": "9876543210",
            "password": "Secret123"
        }))
        .unwrap();
        assert!(valid.validate().is_ok());

        let bad_mobile: RegisterUserRequest = serde_json::from_value(serde_json::json!({
            "name": "Asha",
            "email": "asha@example.com",
            "mobile": "98765",
            "password": "Secret123"
        }))
        .unwrap();
        assert!(bad_mobile.validate().is_err());
    }

    #[test]
    fn test_password_redacted_in_debug() {
        let req: RegisterAdminRequest = serde_json::from_value(serde_json::json!({
            "name": "Root",
            "email": "root@example.com",
            "password": "hunter2hunter2"
        }))
        .unwrap();
        assert!(!format!("{:?}", req).contains("hunter2"));
    }

    #[test]
    fn test_response_drops_password_hash() {
        let account = Account {
            id: Uuid::new_v4(),
            role: Role::User,
            name: "n".to_string(),
            email: "n@example.com".to_string(),
            mobile: Some("9876543210".to_string()),
            password_hash: "$argon2id$v=19$secret".to_string(),
            profile: UserProfile {
                age: Some(30),
                ..UserProfile::default()
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&AccountResponse::from(account)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"age\":30"));
    }

    #[test]
    fn test_profile_accepts_legacy_names() {
        let req: RegisterUserRequest = serde_json::from_value(serde_json::json!({
            "name": "Asha",
            "email": "asha@example.com",
            "mobile": "9876543210",
            "password": "Secret123",
            "age": 29,
            "DOB": "1995-04-12",
            "cast": "General",
            "Father_Number": "9123456780",
            "marital_status": false
        }))
        .unwrap();

        assert!(req.validate().is_ok());
        assert_eq!(req.profile.dob, NaiveDate::from_ymd_opt(1995, 4, 12));
        assert_eq!(req.profile.user_cast.as_deref(), Some("General"));
        assert_eq!(req.profile.father_mobile.as_deref(), Some("9123456780"));
        assert_eq!(req.profile.marital_status, Some(false));
    }

    #[test]
    fn test_profile_validation() {
        let too_old = UserProfile {
            age: Some(121),
            ..UserProfile::default()
        };
        assert!(too_old.validate().is_err());

        let zero = UserProfile {
            age: Some(0),
            ..UserProfile::default()
        };
        assert!(zero.validate().is_err());

        let bad_father = UserProfile {
            father_mobile: Some("12345".to_string()),
            ..UserProfile::default()
        };
        assert!(bad_father.validate().is_err());

        assert!(UserProfile::default().validate().is_ok());
    }

    #[test]
    fn test_unparseable_dob_rejected() {
        let result = serde_json::from_value::<UserProfile>(serde_json::json!({
            "dob": "31/02/1990"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_normalized() {
        let profile = UserProfile {
            address: Some("  12 Main St ".to_string()),
            occupation: Some("   ".to_string()),
            ..UserProfile::default()
        }
        .normalized();

        assert_eq!(profile.address.as_deref(), Some("12 Main St"));
        assert_eq!(profile.occupation, None);
    }
}
