//! Reconciliation reads against the system catalog views. All the quirks of
//! observing grants live here, defined once: boolean flags normalized across
//! server builds, the two-step "ALL" fallback, and the dedicated connection
//! privilege view.

use crate::{
    database::Database,
    grant::ALL_PRIVILEGES,
    DbError,
    Value,
};
use log::debug;

const SYS_PRIVS: &str =
    "SELECT ADMIN_OPTION FROM EXA_DBA_SYS_PRIVS WHERE GRANTEE = ? AND PRIVILEGE = ?";
const OBJ_PRIVS: &str = "SELECT 1 FROM EXA_DBA_OBJ_PRIVS \
     WHERE GRANTEE = ? AND PRIVILEGE = ? AND OBJECT_TYPE = ? AND OBJECT_NAME = ?";
const OBJ_PRIVS_ALL: &str = "SELECT 1 FROM EXA_DBA_OBJ_PRIVS \
     WHERE GRANTEE = ? AND PRIVILEGE = 'ALL' AND OBJECT_TYPE = ? AND OBJECT_NAME = ?";
const OBJ_PRIVS_COUNT: &str = "SELECT COUNT(*) FROM EXA_DBA_OBJ_PRIVS \
     WHERE GRANTEE = ? AND OBJECT_TYPE = ? AND OBJECT_NAME = ?";
const ROLE_PRIVS: &str =
    "SELECT ADMIN_OPTION FROM EXA_DBA_ROLE_PRIVS WHERE GRANTED_ROLE = ? AND GRANTEE = ?";
// connection grants live in their own view, not in EXA_DBA_OBJ_PRIVS
const CONNECTION_PRIVS: &str =
    "SELECT 1 FROM EXA_DBA_CONNECTION_PRIVS WHERE GRANTED_CONNECTION = ? AND GRANTEE = ?";

/// What one catalog lookup saw. Built fresh on every read and discarded once
/// folded into the reconciled record; never cached across passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observed {
    pub found: bool,
    /// The server's admin-option flag, normalized to a boolean, when the
    /// grant kind has one and the row was found.
    pub admin_option: Option<bool>,
}

impl Observed {
    fn absent() -> Self {
        Observed {
            found: false,
            admin_option: None,
        }
    }
}

pub struct CatalogReader<'a> {
    db: &'a mut dyn Database,
}

impl<'a> CatalogReader<'a> {
    pub fn new(db: &'a mut dyn Database) -> Self {
        CatalogReader { db }
    }

    pub fn system_privilege(
        &mut self,
        grantee: &str,
        privilege: &str,
    ) -> Result<Observed, DbError> {
        let grantee = grantee.to_uppercase();
        let privilege = privilege.trim().to_uppercase();
        let row = self
            .db
            .query_single(SYS_PRIVS, &[grantee.into(), privilege.into()])?;
        Ok(match row {
            Some(flag) => Observed {
                found: true,
                admin_option: Some(flag.is_truthy()),
            },
            None => Observed::absent(),
        })
    }

    /// Whether one declared object privilege currently holds. For `ALL`, a
    /// literal `ALL` row satisfies the declaration; failing that, *any*
    /// privilege row on the object does, because the server may have expanded
    /// `ALL` into its constituents at grant time.
    pub fn object_privilege(
        &mut self,
        grantee: &str,
        privilege: &str,
        object_type: &str,
        object_name: &str,
    ) -> Result<bool, DbError> {
        let grantee = grantee.to_uppercase();
        let privilege = privilege.trim().to_uppercase();
        let object_type = object_type.to_uppercase();
        let object_name = object_name.to_uppercase();

        if privilege == ALL_PRIVILEGES {
            let literal = self.db.query_exists(
                OBJ_PRIVS_ALL,
                &[
                    grantee.clone().into(),
                    object_type.clone().into(),
                    object_name.clone().into(),
                ],
            )?;
            if literal {
                return Ok(true);
            }
            let count = self
                .db
                .query_single(
                    OBJ_PRIVS_COUNT,
                    &[grantee.into(), object_type.into(), object_name.into()],
                )?
                .and_then(|v| v.as_long())
                .unwrap_or(0);
            debug!("ALL not stored literally, {} expanded rows found", count);
            return Ok(count > 0);
        }

        self.db.query_exists(
            OBJ_PRIVS,
            &[
                grantee.into(),
                privilege.into(),
                object_type.into(),
                object_name.into(),
            ],
        )
    }

    /// Check each declared privilege individually and return the observed
    /// subset, in canonical (uppercased) form.
    pub fn object_privileges(
        &mut self,
        grantee: &str,
        privileges: &[String],
        object_type: &str,
        object_name: &str,
    ) -> Result<Vec<String>, DbError> {
        let mut observed = vec![];
        for privilege in privileges {
            let privilege = privilege.trim().to_uppercase();
            if self.object_privilege(grantee, &privilege, object_type, object_name)? {
                observed.push(privilege);
            }
        }
        Ok(observed)
    }

    pub fn role_grant(&mut self, role: &str, grantee: &str) -> Result<Observed, DbError> {
        let role = role.to_uppercase();
        let grantee = grantee.to_uppercase();
        let row = self
            .db
            .query_single(ROLE_PRIVS, &[role.into(), grantee.into()])?;
        Ok(match row {
            Some(flag) => Observed {
                found: true,
                admin_option: Some(flag.is_truthy()),
            },
            None => Observed::absent(),
        })
    }

    pub fn connection_grant(
        &mut self,
        connection_name: &str,
        grantee: &str,
    ) -> Result<bool, DbError> {
        let connection_name = connection_name.to_uppercase();
        let grantee = grantee.to_uppercase();
        self.db
            .query_exists(CONNECTION_PRIVS, &[connection_name.into(), grantee.into()])
    }
}
