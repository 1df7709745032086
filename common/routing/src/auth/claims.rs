use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{roles::Roles, user::AuthedUser};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    sub: String,
    email: Option<String>,
    // a single string or an array, depending on the issuer
    #[serde(default)]
    aud: Value,
    exp: usize,
    iss: String,
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

impl Claims {
    /// Roles are read from the string array found at the dot separated
    /// `roles_path`, e.g. `realm_access.roles`. A missing path means no roles.
    pub fn into_authed_user<R: Roles>(self, roles_path: &str) -> AuthedUser<R> {
        let mut current = Some(Value::Object(self.extra));

        for part in roles_path.split('.') {
            current = current.and_then(|mut v| v.get_mut(part).map(Value::take));
        }

        let roles = match current {
            Some(Value::Array(roles)) => roles
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|r| r.parse::<R>().ok())
                .fold(R::none(), |mut acc, next| {
                    acc.add(next);
                    acc
                }),
            _ => R::none(),
        };

        AuthedUser {
            id: self.sub.into(),
            email: self.email.map(Into::into),
            roles,
        }
    }
}
