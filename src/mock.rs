//! In-memory stand-in for the [`Database`] seam: records every mutating
//! statement and answers the catalog queries the crate issues from seeded
//! rows. Failures can be scripted per statement to exercise the retry path.

use crate::{
    database::Database,
    DbError,
    Rows,
    Value,
};
use std::collections::VecDeque;

#[derive(Default)]
pub(crate) struct MockDb {
    pub executed: Vec<String>,
    /// grantee, privilege, admin option (as the server would report it)
    pub sys_privs: Vec<(String, String, String)>,
    /// grantee, privilege, object type, object name
    pub obj_privs: Vec<(String, String, String, String)>,
    /// granted role, grantee, admin option
    pub role_privs: Vec<(String, String, String)>,
    /// granted connection, grantee
    pub conn_privs: Vec<(String, String)>,
    pub users: Vec<String>,
    pub roles: Vec<String>,
    pub schemas: Vec<String>,
    pub connections: Vec<String>,
    /// scripted outcomes for upcoming `execute_sql` calls
    pub fail_executes: VecDeque<DbError>,
}

impl MockDb {
    pub fn new() -> Self {
        MockDb::default()
    }

    pub fn grant_sys(&mut self, grantee: &str, privilege: &str, admin: &str) {
        self.sys_privs
            .push((grantee.to_string(), privilege.to_string(), admin.to_string()));
    }

    pub fn grant_obj(&mut self, grantee: &str, privilege: &str, object_type: &str, object_name: &str) {
        self.obj_privs.push((
            grantee.to_string(),
            privilege.to_string(),
            object_type.to_string(),
            object_name.to_string(),
        ));
    }

    pub fn grant_role(&mut self, role: &str, grantee: &str, admin: &str) {
        self.role_privs
            .push((role.to_string(), grantee.to_string(), admin.to_string()));
    }

    pub fn grant_connection(&mut self, connection: &str, grantee: &str) {
        self.conn_privs
            .push((connection.to_string(), grantee.to_string()));
    }
}

fn text(params: &[Value], index: usize) -> &str {
    params.get(index).and_then(|v| v.as_text()).unwrap_or("")
}

fn hits(count: usize) -> Rows {
    let mut rows = Rows::new(vec!["X".to_string()]);
    for _ in 0..count {
        rows.push(vec![Value::Long(1)]);
    }
    rows
}

impl Database for MockDb {
    fn execute_sql(&mut self, sql: &str) -> Result<(), DbError> {
        self.executed.push(sql.to_string());
        match self.fail_executes.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn query_rows(&mut self, sql: &str, params: &[Value]) -> Result<Rows, DbError> {
        if sql.contains("EXA_DBA_SYS_PRIVS") {
            let mut rows = Rows::new(vec!["ADMIN_OPTION".to_string()]);
            for (grantee, privilege, admin) in &self.sys_privs {
                if grantee == text(params, 0) && privilege == text(params, 1) {
                    rows.push(vec![Value::Text(admin.clone())]);
                }
            }
            return Ok(rows);
        }
        if sql.contains("EXA_DBA_OBJ_PRIVS") {
            if sql.contains("COUNT(*)") {
                let count = self
                    .obj_privs
                    .iter()
                    .filter(|(grantee, _, object_type, object_name)| {
                        grantee == text(params, 0)
                            && object_type == text(params, 1)
                            && object_name == text(params, 2)
                    })
                    .count();
                let mut rows = Rows::new(vec!["COUNT".to_string()]);
                rows.push(vec![Value::Long(count as i64)]);
                return Ok(rows);
            }
            let wanted: (&str, &str, &str, &str) = if sql.contains("PRIVILEGE = 'ALL'") {
                (text(params, 0), "ALL", text(params, 1), text(params, 2))
            } else {
                (
                    text(params, 0),
                    text(params, 1),
                    text(params, 2),
                    text(params, 3),
                )
            };
            let count = self
                .obj_privs
                .iter()
                .filter(|(grantee, privilege, object_type, object_name)| {
                    (grantee.as_str(), privilege.as_str(), object_type.as_str(), object_name.as_str())
                        == wanted
                })
                .count();
            return Ok(hits(count));
        }
        if sql.contains("EXA_DBA_ROLE_PRIVS") {
            let mut rows = Rows::new(vec!["ADMIN_OPTION".to_string()]);
            for (role, grantee, admin) in &self.role_privs {
                if role == text(params, 0) && grantee == text(params, 1) {
                    rows.push(vec![Value::Text(admin.clone())]);
                }
            }
            return Ok(rows);
        }
        if sql.contains("EXA_DBA_CONNECTION_PRIVS") {
            let count = self
                .conn_privs
                .iter()
                .filter(|(connection, grantee)| {
                    connection == text(params, 0) && grantee == text(params, 1)
                })
                .count();
            return Ok(hits(count));
        }
        if sql.contains("EXA_ALL_USERS") {
            let mut rows = Rows::new(vec!["USER_NAME".to_string()]);
            for user in &self.users {
                if !sql.contains("WHERE") || user == text(params, 0) {
                    rows.push(vec![Value::Text(user.clone())]);
                }
            }
            return Ok(rows);
        }
        if sql.contains("EXA_DBA_ROLES") {
            let mut rows = Rows::new(vec!["ROLE_NAME".to_string()]);
            for role in &self.roles {
                if !sql.contains("WHERE") || role == text(params, 0) {
                    rows.push(vec![Value::Text(role.clone())]);
                }
            }
            return Ok(rows);
        }
        if sql.contains("EXA_ALL_SCHEMAS") {
            let count = self
                .schemas
                .iter()
                .filter(|s| *s == text(params, 0))
                .count();
            return Ok(hits(count));
        }
        if sql.contains("EXA_DBA_CONNECTIONS") {
            let count = self
                .connections
                .iter()
                .filter(|c| *c == text(params, 0))
                .count();
            return Ok(hits(count));
        }
        Err(DbError::from_server(sql, None, "query not understood by mock"))
    }
}
