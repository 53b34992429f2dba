use crate::Database;
use crate::models::{AdminRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Admins --

    /// Insert an admin with a fresh email-verification token.
    /// Returns the new row id.
    pub fn create_admin(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        verification_token: &str,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO admins (username, email, password_hash, active, email_verified, verification_token)
                 VALUES (?1, ?2, ?3, 0, 0, ?4)",
                (username, email, password_hash, verification_token),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Duplicate pre-check used by registration: (username taken, email taken).
    pub fn admin_exists(&self, username: &str, email: &str) -> Result<(bool, bool)> {
        self.with_conn(|conn| {
            let (by_name, by_email): (i64, i64) = conn.query_row(
                "SELECT (SELECT COUNT(1) FROM admins WHERE username = ?1),
                        (SELECT COUNT(1) FROM admins WHERE email = ?2)",
                (username, email),
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok((by_name > 0, by_email > 0))
        })
    }

    pub fn get_admin_by_email(&self, email: &str) -> Result<Option<AdminRow>> {
        self.with_conn(|conn| query_admin_by_email(conn, email))
    }

    // -- End users --

    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        phone: Option<&str>,
        server_url: Option<&str>,
        active: bool,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password_hash, phone, server_url, active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (username, email, password_hash, phone, server_url, active),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn user_exists(&self, username: &str, email: &str) -> Result<(bool, bool)> {
        self.with_conn(|conn| {
            let (by_name, by_email): (i64, i64) = conn.query_row(
                "SELECT (SELECT COUNT(1) FROM users WHERE username = ?1),
                        (SELECT COUNT(1) FROM users WHERE email = ?2)",
                (username, email),
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok((by_name > 0, by_email > 0))
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, username, email, password_hash, phone, server_url, active, created_at
                     FROM users WHERE username = ?1",
                    [username],
                    |row| {
                        Ok(UserRow {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            email: row.get(2)?,
                            password_hash: row.get(3)?,
                            phone: row.get(4)?,
                            server_url: row.get(5)?,
                            active: row.get(6)?,
                            created_at: row.get(7)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }
}

fn query_admin_by_email(conn: &Connection, email: &str) -> Result<Option<AdminRow>> {
    let row = conn
        .query_row(
            "SELECT id, username, email, password_hash, active, email_verified, created_at
             FROM admins WHERE email = ?1",
            [email],
            |row| {
                Ok(AdminRow {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    email: row.get(2)?,
                    password_hash: row.get(3)?,
                    active: row.get(4)?,
                    email_verified: row.get(5)?,
                    created_at: row.get(6)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use crate::Database;

    #[test]
    fn admin_duplicate_precheck() {
        let db = Database::open_in_memory().unwrap();
        db.create_admin("alice", "a@x.com", "hash", "tok").unwrap();

        assert_eq!(db.admin_exists("alice", "other@x.com").unwrap(), (true, false));
        assert_eq!(db.admin_exists("bob", "a@x.com").unwrap(), (false, true));
        assert_eq!(db.admin_exists("bob", "b@x.com").unwrap(), (false, false));
    }

    #[test]
    fn new_admin_starts_unverified() {
        let db = Database::open_in_memory().unwrap();
        db.create_admin("alice", "a@x.com", "hash", "tok").unwrap();

        let admin = db.get_admin_by_email("a@x.com").unwrap().unwrap();
        assert!(!admin.email_verified);
        assert!(!admin.active);
    }

    #[test]
    fn user_lookup_by_username() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .create_user("carla", "c@x.com", "hash", Some("50761111111"), None, true)
            .unwrap();

        let user = db.get_user_by_username("carla").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert!(user.active);
        assert!(db.get_user_by_username("nobody").unwrap().is_none());
    }
}
