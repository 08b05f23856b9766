use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::claims::Claims;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn from_claims(claims: &Claims) -> Self {
        let email = claims.string("email").unwrap_or_default();
        User {
            id: claims
                .string("sub")
                .or_else(|| claims.string("username"))
                .unwrap_or_default(),
            name: claims.string("name").unwrap_or_else(|| email.clone()),
            email,
        }
    }

    /// Builds a user from Cognito `GetUser` attributes.
    pub fn from_attributes(attrs: &HashMap<String, String>) -> Self {
        let attr = |key: &str| attrs.get(key).filter(|v| !v.is_empty()).cloned();
        let email = attr("email").unwrap_or_default();
        User {
            id: attr("sub").unwrap_or_default(),
            name: attr("name").unwrap_or_else(|| email.clone()),
            email,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use serde_json::json;

    fn claims(payload: serde_json::Value) -> Claims {
        let token = format!("h.{}.s", URL_SAFE_NO_PAD.encode(payload.to_string()));
        Claims::decode(&token).unwrap()
    }

    #[test]
    fn user_matches_claims() {
        let user = User::from_claims(&claims(json!({
            "sub": "u-1",
            "name": "Jane Doe",
            "email": "jane@example.com",
            "exp": 1_900_000_000
        })));
        assert_eq!(
            user,
            User {
                id: "u-1".into(),
                name: "Jane Doe".into(),
                email: "jane@example.com".into(),
            }
        );
    }

    #[test]
    fn falls_back_to_username_and_email() {
        let user = User::from_claims(&claims(json!({
            "username": "jdoe",
            "email": "jane@example.com"
        })));
        assert_eq!(user.id, "jdoe");
        assert_eq!(user.name, "jane@example.com");

        let user = User::from_claims(&claims(json!({})));
        assert_eq!(user.id, "");
        assert_eq!(user.name, "");
        assert_eq!(user.email, "");
    }

    #[test]
    fn user_from_attributes() {
        let attrs = HashMap::from([
            ("sub".to_string(), "s-9".to_string()),
            ("email".to_string(), "a@b.c".to_string()),
        ]);
        let user = User::from_attributes(&attrs);
        assert_eq!(user.id, "s-9");
        assert_eq!(user.name, "a@b.c");
    }
}
