use crate::{
    error::ValidationError,
    ident,
};
use serde::{Deserialize, Serialize};

/// The special privilege token the server may store literally or expand into
/// the full set of individual privileges for the object type.
pub const ALL_PRIVILEGES: &str = "ALL";

const IDENTITY_SEP: &str = "|";

/// A declared desired-state grant. One closed variant per grant kind, each
/// carrying exactly the coordinates that kind needs.
///
/// `admin_option` is tri-state: `None` (the caller expressed no opinion) is
/// semantically distinct from `Some(false)` and survives reconciliation
/// unchanged. Connection grants have no admin-option concept.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Grant {
    SystemPrivilege {
        grantee: String,
        privilege: String,
        admin_option: Option<bool>,
    },
    ObjectPrivilege {
        grantee: String,
        /// Set-semantic: order never matters, duplicates are ignored.
        privileges: Vec<String>,
        object_type: String,
        /// May be schema-qualified as `SCHEMA.OBJECT`.
        object_name: String,
    },
    RoleGrant {
        role: String,
        grantee: String,
        admin_option: Option<bool>,
    },
    ConnectionGrant {
        connection_name: String,
        grantee: String,
    },
}

/// Uppercase, trim, deduplicate and sort a privilege list into its canonical
/// set form.
pub(crate) fn normalize_privileges(privileges: &[String]) -> Vec<String> {
    let mut set: Vec<String> = privileges
        .iter()
        .map(|p| p.trim().to_uppercase())
        .collect();
    set.sort();
    set.dedup();
    set
}

/// The identity renders unset admin option as `false`; the declaration itself
/// keeps the tri-state.
fn admin_token(admin_option: Option<bool>) -> &'static str {
    if admin_option == Some(true) {
        "true"
    } else {
        "false"
    }
}

impl Grant {
    pub fn kind(&self) -> &'static str {
        match *self {
            Grant::SystemPrivilege { .. } => "system privilege",
            Grant::ObjectPrivilege { .. } => "object privilege",
            Grant::RoleGrant { .. } => "role grant",
            Grant::ConnectionGrant { .. } => "connection grant",
        }
    }

    pub fn grantee(&self) -> &str {
        match *self {
            Grant::SystemPrivilege { ref grantee, .. }
            | Grant::ObjectPrivilege { ref grantee, .. }
            | Grant::RoleGrant { ref grantee, .. }
            | Grant::ConnectionGrant { ref grantee, .. } => grantee,
        }
    }

    /// Fail fast on bad identifiers or missing coordinates; nothing reaches
    /// the database when this errors.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            Grant::SystemPrivilege {
                ref grantee,
                ref privilege,
                ..
            } => {
                ident::validate_identifier(grantee)?;
                ident::validate_privilege(privilege)?;
            }
            Grant::ObjectPrivilege {
                ref grantee,
                ref privileges,
                ref object_type,
                ref object_name,
            } => {
                ident::validate_identifier(grantee)?;
                if privileges.is_empty() {
                    return Err(ValidationError::EmptyPrivileges);
                }
                for privilege in privileges {
                    ident::validate_privilege(privilege)?;
                }
                if object_type.is_empty() {
                    return Err(ValidationError::MissingCoordinate {
                        kind: "object privilege",
                        field: "object_type",
                    });
                }
                ident::validate_identifier(object_type)?;
                if object_name.is_empty() {
                    return Err(ValidationError::MissingCoordinate {
                        kind: "object privilege",
                        field: "object_name",
                    });
                }
                if object_name
                    .split('.')
                    .any(|part| part.trim_matches('"').is_empty())
                {
                    return Err(ValidationError::InvalidIdentifier(object_name.clone()));
                }
            }
            Grant::RoleGrant {
                ref role,
                ref grantee,
                ..
            } => {
                ident::validate_identifier(role)?;
                ident::validate_identifier(grantee)?;
            }
            Grant::ConnectionGrant {
                ref connection_name,
                ref grantee,
            } => {
                ident::validate_identifier(connection_name)?;
                ident::validate_identifier(grantee)?;
            }
        }
        Ok(())
    }

    /// The canonical reconciliation key. Uppercased fields, privileges sorted
    /// and comma-joined, admin option rendered as a fixed token; recomputed
    /// from the declaration, never stored on its own.
    ///
    /// Two declarations a human would consider the same grant always produce
    /// the same identity; declarations differing in effective privilege set
    /// never do.
    pub fn identity(&self) -> String {
        match *self {
            Grant::SystemPrivilege {
                ref grantee,
                ref privilege,
                admin_option,
            } => [
                grantee.to_uppercase(),
                privilege.trim().to_uppercase(),
                admin_token(admin_option).to_string(),
            ]
            .join(IDENTITY_SEP),
            Grant::ObjectPrivilege {
                ref grantee,
                ref privileges,
                ref object_type,
                ref object_name,
            } => [
                grantee.to_uppercase(),
                normalize_privileges(privileges).join(","),
                object_type.to_uppercase(),
                object_name.to_uppercase(),
            ]
            .join(IDENTITY_SEP),
            Grant::RoleGrant {
                ref role,
                ref grantee,
                admin_option,
            } => [
                role.to_uppercase(),
                grantee.to_uppercase(),
                admin_token(admin_option).to_string(),
            ]
            .join(IDENTITY_SEP),
            Grant::ConnectionGrant {
                ref connection_name,
                ref grantee,
            } => [connection_name.to_uppercase(), grantee.to_uppercase()].join(IDENTITY_SEP),
        }
    }
}
