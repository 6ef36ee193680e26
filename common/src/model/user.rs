use serde::{Deserialize, Serialize};

/// A registered user, as stored in the `users` table. The password is kept
/// only as an Argon2 hash and must never be rendered or logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    /// The display name recorded as `author` on books this user uploads.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
