//! Pure GRANT/REVOKE statement construction. Execution is the caller's
//! responsibility; nothing here touches the database.

use crate::{
    error::ValidationError,
    grant::{
        normalize_privileges,
        Grant,
    },
    ident,
};

pub(crate) fn object_grant_sql(
    privilege: &str,
    object_type: &str,
    object_name: &str,
    grantee: &str,
) -> String {
    format!(
        "GRANT {} ON {} {} TO \"{}\"",
        privilege,
        object_type,
        ident::qualify(object_name),
        grantee
    )
}

pub(crate) fn object_revoke_sql(
    privilege: &str,
    object_type: &str,
    object_name: &str,
    grantee: &str,
) -> String {
    format!(
        "REVOKE {} ON {} {} FROM \"{}\"",
        privilege,
        object_type,
        ident::qualify(object_name),
        grantee
    )
}

fn admin_clause(admin_option: Option<bool>) -> &'static str {
    // appended only when the caller explicitly asked for it
    if admin_option == Some(true) {
        " WITH ADMIN OPTION"
    } else {
        ""
    }
}

/// Render the GRANT statements for a declaration: a single statement for
/// system, role and connection grants, one statement per effective privilege
/// for object grants.
pub fn build_grant(grant: &Grant) -> Result<Vec<String>, ValidationError> {
    grant.validate()?;
    let statements = match *grant {
        Grant::SystemPrivilege {
            ref grantee,
            ref privilege,
            admin_option,
        } => {
            vec![format!(
                "GRANT {} TO \"{}\"{}",
                privilege.trim().to_uppercase(),
                grantee.to_uppercase(),
                admin_clause(admin_option)
            )]
        }
        Grant::ObjectPrivilege {
            ref grantee,
            ref privileges,
            ref object_type,
            ref object_name,
        } => {
            let grantee = grantee.to_uppercase();
            let object_type = object_type.to_uppercase();
            let object_name = object_name.to_uppercase();
            normalize_privileges(privileges)
                .iter()
                .map(|privilege| object_grant_sql(privilege, &object_type, &object_name, &grantee))
                .collect()
        }
        Grant::RoleGrant {
            ref role,
            ref grantee,
            admin_option,
        } => {
            vec![format!(
                "GRANT \"{}\" TO \"{}\"{}",
                role.to_uppercase(),
                grantee.to_uppercase(),
                admin_clause(admin_option)
            )]
        }
        Grant::ConnectionGrant {
            ref connection_name,
            ref grantee,
        } => {
            vec![format!(
                "GRANT CONNECTION \"{}\" TO \"{}\"",
                connection_name.to_uppercase(),
                grantee.to_uppercase()
            )]
        }
    };
    Ok(statements)
}

/// Render the matching REVOKE statements. Revokes never carry the admin
/// clause; revoking the privilege removes the option with it.
pub fn build_revoke(grant: &Grant) -> Result<Vec<String>, ValidationError> {
    grant.validate()?;
    let statements = match *grant {
        Grant::SystemPrivilege {
            ref grantee,
            ref privilege,
            ..
        } => {
            vec![format!(
                "REVOKE {} FROM \"{}\"",
                privilege.trim().to_uppercase(),
                grantee.to_uppercase()
            )]
        }
        Grant::ObjectPrivilege {
            ref grantee,
            ref privileges,
            ref object_type,
            ref object_name,
        } => {
            let grantee = grantee.to_uppercase();
            let object_type = object_type.to_uppercase();
            let object_name = object_name.to_uppercase();
            normalize_privileges(privileges)
                .iter()
                .map(|privilege| object_revoke_sql(privilege, &object_type, &object_name, &grantee))
                .collect()
        }
        Grant::RoleGrant {
            ref role,
            ref grantee,
            ..
        } => {
            vec![format!(
                "REVOKE \"{}\" FROM \"{}\"",
                role.to_uppercase(),
                grantee.to_uppercase()
            )]
        }
        Grant::ConnectionGrant {
            ref connection_name,
            ref grantee,
        } => {
            vec![format!(
                "REVOKE CONNECTION \"{}\" FROM \"{}\"",
                connection_name.to_uppercase(),
                grantee.to_uppercase()
            )]
        }
    };
    Ok(statements)
}
