use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identity a verified session token asserts. This is all a protected
/// handler ever learns about the caller; ownership checks compare
/// `user_id` against a record's stored owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
}
