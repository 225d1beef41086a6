use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

/// Requester role as carried in the bearer token.
///
/// `Citizen` sees only their own documents. The privileged roles
/// (`Officer`, `Admin`, `Department`) may access any document, but every such
/// access is written to the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Citizen,
    Officer,
    Admin,
    Department,
}

impl Role {
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Officer | Role::Admin | Role::Department)
    }

    /// Only officers and admins may verify (approve/reject) documents.
    pub fn can_verify(self) -> bool {
        matches!(self, Role::Officer | Role::Admin)
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "citizen" => Ok(Role::Citizen),
            "officer" => Ok(Role::Officer),
            "admin" => Ok(Role::Admin),
            "department" => Ok(Role::Department),
            _ => Err(anyhow::anyhow!("Invalid role: {}", s)),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Role::Citizen => write!(f, "citizen"),
            Role::Officer => write!(f, "officer"),
            Role::Admin => write!(f, "admin"),
            Role::Department => write!(f, "department"),
        }
    }
}

/// The authenticated identity behind a custody call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requester {
    pub id: String,
    pub role: Role,
    /// Department the requester belongs to, when role is officer/department.
    pub department: Option<String>,
}

impl Requester {
    pub fn citizen(id: impl Into<String>) -> Self {
        Requester {
            id: id.into(),
            role: Role::Citizen,
            department: None,
        }
    }

    pub fn officer(id: impl Into<String>, department: impl Into<String>) -> Self {
        Requester {
            id: id.into(),
            role: Role::Officer,
            department: Some(department.into()),
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Requester {
            id: id.into(),
            role: Role::Admin,
            department: None,
        }
    }
}
