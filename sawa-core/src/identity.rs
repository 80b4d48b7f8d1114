use serde::{Deserialize, Serialize};

/// Staff role flag stored on the user profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    Admin,
    Office,
    Marketing,
}

/// Email-keyed user profile. The document id is the email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub host_approved: bool,
    #[serde(default)]
    pub role_type: Option<RoleType>,
    #[serde(default)]
    pub office_id: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            full_name: None,
            host_approved: false,
            role_type: None,
            office_id: None,
            city: None,
        }
    }

    /// Staff flags win over host approval.
    pub fn role(&self) -> Role {
        match self.role_type {
            Some(RoleType::Admin) => Role::Admin,
            Some(RoleType::Office) => Role::Office,
            Some(RoleType::Marketing) => Role::Marketing,
            None if self.host_approved => Role::Host,
            None => Role::Traveler,
        }
    }
}

/// Effective role that gates what a viewer may see and do
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Office,
    Marketing,
    Host,
    Traveler,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Office => "office",
            Role::Marketing => "marketing",
            Role::Host => "host",
            Role::Traveler => "traveler",
        }
    }
}

/// The authenticated caller of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub email: String,
    pub role: Role,
}

impl Viewer {
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self { email: email.into(), role }
    }

    pub fn can_manage_bookings(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Office)
    }

    pub fn can_view_reports(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Office | Role::Marketing)
    }

    pub fn can_submit_offers(&self) -> bool {
        self.role == Role::Host
    }

    pub fn is(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}
