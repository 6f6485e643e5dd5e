use serde::{Deserialize, Serialize};

use super::Audience;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Moderator,
    Admin,
}

impl Role {
    /// Admins and moderators may create, edit, pin and delete announcements.
    pub fn can_publish(&self) -> bool {
        matches!(self, Role::Admin | Role::Moderator)
    }
}

/// Whoever is asking: an anonymous visitor or an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User { id: i64, role: Role },
}

impl Viewer {
    pub fn is_publisher(&self) -> bool {
        match self {
            Viewer::Anonymous => false,
            Viewer::User { role, .. } => role.can_publish(),
        }
    }

    pub fn can_read(&self, audience: Audience) -> bool {
        match (self, audience) {
            (_, Audience::Public) => true,
            (Viewer::Anonymous, _) => false,
            (Viewer::User { role, .. }, _) if role.can_publish() => true,
            (Viewer::User { .. }, Audience::All) => true,
            (Viewer::User { role, .. }, Audience::Students) => *role == Role::Student,
            (Viewer::User { role, .. }, Audience::Teachers) => *role == Role::Teacher,
        }
    }
}
