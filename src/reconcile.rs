//! The per-kind reconciliation engine. Every operation is a sequence of
//! independent round-trips through the [`Database`] seam; repeated
//! reconciliation of an unchanged declaration converges to zero mutating
//! statements.

use crate::{
    catalog::CatalogReader,
    database::Database,
    grant::{
        normalize_privileges,
        Grant,
    },
    retry::{
        execute_with_retry,
        RetryPolicy,
    },
    statement::{
        self,
        object_grant_sql,
        object_revoke_sql,
    },
    DbError,
};
use log::{
    info,
    warn,
};
use serde::{Deserialize, Serialize};

/// A reconciled record: the declaration plus its canonical identity. The
/// identity is always recomputed from the declaration, never carried
/// independently of it.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct GrantState {
    pub grant: Grant,
    pub id: String,
}

impl GrantState {
    pub fn new(grant: Grant) -> Self {
        let id = grant.identity();
        GrantState { grant, id }
    }
}

/// Declared-unset stays unset so no diff is manufactured on an attribute the
/// caller never expressed an opinion about; an explicit declaration adopts
/// whatever the catalog reports. Applied uniformly to every grant kind.
fn reconcile_admin(declared: Option<bool>, observed: Option<bool>) -> Option<bool> {
    match declared {
        None => None,
        Some(_) => observed,
    }
}

/// A rename leaves grants attached to the renamed object, so an update that
/// changes nothing but the object name must not issue any SQL.
fn is_object_rename(old: &Grant, new: &Grant) -> bool {
    match (old, new) {
        (
            Grant::ObjectPrivilege {
                grantee: old_grantee,
                privileges: old_privileges,
                object_type: old_type,
                object_name: old_name,
            },
            Grant::ObjectPrivilege {
                grantee: new_grantee,
                privileges: new_privileges,
                object_type: new_type,
                object_name: new_name,
            },
        ) => {
            old_grantee.eq_ignore_ascii_case(new_grantee)
                && old_type.eq_ignore_ascii_case(new_type)
                && normalize_privileges(old_privileges) == normalize_privileges(new_privileges)
                && !old_name.eq_ignore_ascii_case(new_name)
        }
        _ => false,
    }
}

pub struct Reconciler<'a> {
    db: &'a mut dyn Database,
    retry: RetryPolicy,
}

impl<'a> Reconciler<'a> {
    pub fn new(db: &'a mut dyn Database) -> Self {
        Reconciler {
            db,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(db: &'a mut dyn Database, retry: RetryPolicy) -> Self {
        Reconciler { db, retry }
    }

    /// Validate, issue the grant statement(s), and return the reconciled
    /// record with its identity.
    pub fn create(&mut self, grant: &Grant) -> Result<GrantState, DbError> {
        for sql in statement::build_grant(grant)? {
            execute_with_retry(self.db, &self.retry, &sql)?;
        }
        Ok(GrantState::new(grant.clone()))
    }

    /// Drift check. `Ok(None)` means the declaration is no longer satisfied
    /// at all and the record should be dropped from reconciled state. For
    /// multi-privilege grants the returned record keeps only the observed
    /// subset of privileges, so a later update can re-grant what is missing.
    pub fn read(&mut self, state: &GrantState) -> Result<Option<GrantState>, DbError> {
        let mut catalog = CatalogReader::new(self.db);
        match state.grant {
            Grant::SystemPrivilege {
                ref grantee,
                ref privilege,
                admin_option,
            } => {
                let observed = catalog.system_privilege(grantee, privilege)?;
                if !observed.found {
                    return Ok(None);
                }
                Ok(Some(GrantState::new(Grant::SystemPrivilege {
                    grantee: grantee.clone(),
                    privilege: privilege.clone(),
                    admin_option: reconcile_admin(admin_option, observed.admin_option),
                })))
            }
            Grant::ObjectPrivilege {
                ref grantee,
                ref privileges,
                ref object_type,
                ref object_name,
            } => {
                let declared = normalize_privileges(privileges);
                let observed =
                    catalog.object_privileges(grantee, &declared, object_type, object_name)?;
                if observed.is_empty() {
                    return Ok(None);
                }
                if observed.len() < declared.len() {
                    info!(
                        "grant for \"{}\" on {} {} drifted, only {:?} still held",
                        grantee, object_type, object_name, observed
                    );
                }
                Ok(Some(GrantState::new(Grant::ObjectPrivilege {
                    grantee: grantee.clone(),
                    privileges: observed,
                    object_type: object_type.clone(),
                    object_name: object_name.clone(),
                })))
            }
            Grant::RoleGrant {
                ref role,
                ref grantee,
                admin_option,
            } => {
                let observed = catalog.role_grant(role, grantee)?;
                if !observed.found {
                    return Ok(None);
                }
                Ok(Some(GrantState::new(Grant::RoleGrant {
                    role: role.clone(),
                    grantee: grantee.clone(),
                    admin_option: reconcile_admin(admin_option, observed.admin_option),
                })))
            }
            Grant::ConnectionGrant {
                ref connection_name,
                ref grantee,
            } => {
                if catalog.connection_grant(connection_name, grantee)? {
                    Ok(Some(GrantState::new(state.grant.clone())))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Move a reconciled record to a new declaration. Coordinate changes
    /// revoke under the old identity and grant under the new one; a pure
    /// privilege-set change touches only the privileges that differ; a pure
    /// object rename touches nothing.
    pub fn update(&mut self, current: &GrantState, desired: &Grant) -> Result<GrantState, DbError> {
        desired.validate()?;

        if current.grant.identity() == desired.identity() {
            return Ok(GrantState::new(desired.clone()));
        }

        if is_object_rename(&current.grant, desired) {
            info!(
                "object rename detected ({} -> {}), grants follow the object, no statements issued",
                current.id,
                desired.identity()
            );
            return Ok(GrantState::new(desired.clone()));
        }

        if let (
            Grant::ObjectPrivilege {
                grantee: old_grantee,
                privileges: old_privileges,
                object_type: old_type,
                object_name: old_name,
            },
            Grant::ObjectPrivilege {
                grantee: new_grantee,
                privileges: new_privileges,
                object_type: new_type,
                object_name: new_name,
            },
        ) = (&current.grant, desired)
        {
            let coordinates_unchanged = old_grantee.eq_ignore_ascii_case(new_grantee)
                && old_type.eq_ignore_ascii_case(new_type)
                && old_name.eq_ignore_ascii_case(new_name);
            if coordinates_unchanged {
                self.update_object_privileges(
                    new_grantee,
                    new_type,
                    new_name,
                    &normalize_privileges(old_privileges),
                    &normalize_privileges(new_privileges),
                )?;
                return Ok(GrantState::new(desired.clone()));
            }
        }

        // full move: revoke under the old identity, grant under the new one
        let best_effort_revoke = matches!(current.grant, Grant::ObjectPrivilege { .. });
        for sql in statement::build_revoke(&current.grant)? {
            match execute_with_retry(self.db, &self.retry, &sql) {
                Err(e) if best_effort_revoke => {
                    warn!("revoke failed (privilege may already be gone): {}", e)
                }
                other => other?,
            }
        }
        for sql in statement::build_grant(desired)? {
            execute_with_retry(self.db, &self.retry, &sql)?;
        }
        Ok(GrantState::new(desired.clone()))
    }

    /// Revoke exactly the removed privileges and grant exactly the added
    /// ones. Unchanged privileges are never revoked and re-granted; that
    /// would churn the catalog and drop them transiently.
    fn update_object_privileges(
        &mut self,
        grantee: &str,
        object_type: &str,
        object_name: &str,
        old: &[String],
        new: &[String],
    ) -> Result<(), DbError> {
        let grantee = grantee.to_uppercase();
        let object_type = object_type.to_uppercase();
        let object_name = object_name.to_uppercase();
        for removed in old.iter().filter(|p| !new.contains(*p)) {
            let sql = object_revoke_sql(removed, &object_type, &object_name, &grantee);
            if let Err(e) = execute_with_retry(self.db, &self.retry, &sql) {
                warn!("revoke failed (privilege may already be gone): {}", e);
            }
        }
        for added in new.iter().filter(|p| !old.contains(*p)) {
            let sql = object_grant_sql(added, &object_type, &object_name, &grantee);
            execute_with_retry(self.db, &self.retry, &sql)?;
        }
        Ok(())
    }

    /// Revoke everything the record declares. Best-effort: every statement is
    /// attempted even when an earlier one fails, since an out-of-band revoke
    /// may already have removed part of the grant; the first failure is still
    /// reported.
    pub fn delete(&mut self, state: &GrantState) -> Result<(), DbError> {
        info!(
            "removing {} for \"{}\"",
            state.grant.kind(),
            state.grant.grantee()
        );
        let mut first_err = None;
        for sql in statement::build_revoke(&state.grant)? {
            if let Err(e) = execute_with_retry(self.db, &self.retry, &sql) {
                warn!("revoke failed (privilege may already be gone): {}", e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Converge the live catalog toward a declaration, issuing only the
    /// statements actually needed. Applying an already-satisfied declaration
    /// issues nothing.
    pub fn apply(&mut self, grant: &Grant) -> Result<GrantState, DbError> {
        grant.validate()?;
        match *grant {
            Grant::SystemPrivilege {
                ref grantee,
                ref privilege,
                admin_option,
            } => {
                let mut catalog = CatalogReader::new(self.db);
                let observed = catalog.system_privilege(grantee, privilege)?;
                if !observed.found {
                    return self.create(grant);
                }
                if let Some(wanted) = admin_option {
                    if observed.admin_option != Some(wanted) {
                        return self.regrant(grant);
                    }
                }
                Ok(GrantState::new(grant.clone()))
            }
            Grant::ObjectPrivilege {
                ref grantee,
                ref privileges,
                ref object_type,
                ref object_name,
            } => {
                let declared = normalize_privileges(privileges);
                let mut catalog = CatalogReader::new(self.db);
                let observed =
                    catalog.object_privileges(grantee, &declared, object_type, object_name)?;
                let grantee = grantee.to_uppercase();
                let object_type = object_type.to_uppercase();
                let object_name = object_name.to_uppercase();
                for missing in declared.iter().filter(|p| !observed.contains(*p)) {
                    let sql = object_grant_sql(missing, &object_type, &object_name, &grantee);
                    execute_with_retry(self.db, &self.retry, &sql)?;
                }
                Ok(GrantState::new(grant.clone()))
            }
            Grant::RoleGrant {
                ref role,
                ref grantee,
                admin_option,
            } => {
                let mut catalog = CatalogReader::new(self.db);
                let observed = catalog.role_grant(role, grantee)?;
                if !observed.found {
                    return self.create(grant);
                }
                if let Some(wanted) = admin_option {
                    if observed.admin_option != Some(wanted) {
                        return self.regrant(grant);
                    }
                }
                Ok(GrantState::new(grant.clone()))
            }
            Grant::ConnectionGrant {
                ref connection_name,
                ref grantee,
            } => {
                let mut catalog = CatalogReader::new(self.db);
                if catalog.connection_grant(connection_name, grantee)? {
                    Ok(GrantState::new(grant.clone()))
                } else {
                    self.create(grant)
                }
            }
        }
    }

    /// There is no ALTER primitive for the admin flag, so converging it means
    /// revoking and granting again with the desired option.
    fn regrant(&mut self, grant: &Grant) -> Result<GrantState, DbError> {
        for sql in statement::build_revoke(grant)? {
            execute_with_retry(self.db, &self.retry, &sql)?;
        }
        self.create(grant)
    }
}
