use crate::Database;
use crate::models::{AccountKind, EmailVerifyOutcome, VerifyOutcome};
use anyhow::Result;
use rusqlite::OptionalExtension;

/// PIN lifetime, minutes.
const PIN_TTL_MINUTES: i64 = 15;

impl Database {
    /// Persist a freshly issued PIN, valid for 15 minutes.
    pub fn insert_auth_token(&self, kind: AccountKind, account_id: i64, token: &str) -> Result<i64> {
        self.insert_auth_token_expiring(kind, account_id, token, PIN_TTL_MINUTES)
    }

    /// Same, with an explicit lifetime. Negative values produce an
    /// already-expired token; used by the expiry tests.
    pub fn insert_auth_token_expiring(
        &self,
        kind: AccountKind,
        account_id: i64,
        token: &str,
        ttl_minutes: i64,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO auth_tokens (account_kind, account_id, token, expires_at, active)
                 VALUES (?1, ?2, ?3, datetime('now', ?4), 1)",
                (
                    kind.as_str(),
                    account_id,
                    token,
                    format!("{:+} minutes", ttl_minutes),
                ),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Verify a PIN by value, consuming it on success.
    ///
    /// Matches the most recently issued token with this value regardless
    /// of its active flag, so a second verification of the same PIN
    /// reports `ExpiredOrUsed` rather than `NotFound`. Account-variant
    /// agnostic: admin and user tokens share the same contract.
    pub fn verify_auth_token(&self, token: &str) -> Result<VerifyOutcome> {
        self.with_conn_mut(|conn| {
            let row: Option<(i64, bool, bool)> = conn
                .query_row(
                    "SELECT id, active, expires_at >= datetime('now')
                     FROM auth_tokens WHERE token = ?1
                     ORDER BY id DESC LIMIT 1",
                    [token],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            match row {
                None => Ok(VerifyOutcome::NotFound),
                Some((id, true, true)) => {
                    // Single-use enforcement.
                    conn.execute("UPDATE auth_tokens SET active = 0 WHERE id = ?1", [id])?;
                    Ok(VerifyOutcome::Valid)
                }
                Some(_) => Ok(VerifyOutcome::ExpiredOrUsed),
            }
        })
    }

    /// Consume an admin email-verification link.
    ///
    /// Idempotent-but-informative: re-verifying an already verified
    /// account reports `AlreadyVerified` instead of an error.
    pub fn verify_admin_email(&self, email: &str, token: &str) -> Result<EmailVerifyOutcome> {
        self.with_conn_mut(|conn| {
            let row: Option<(i64, bool, Option<String>)> = conn
                .query_row(
                    "SELECT id, email_verified, verification_token FROM admins WHERE email = ?1",
                    [email],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            match row {
                None => Ok(EmailVerifyOutcome::Invalid),
                Some((_, true, _)) => Ok(EmailVerifyOutcome::AlreadyVerified),
                Some((id, false, Some(stored))) if stored == token => {
                    conn.execute(
                        "UPDATE admins SET email_verified = 1, active = 1, verification_token = NULL
                         WHERE id = ?1",
                        [id],
                    )?;
                    Ok(EmailVerifyOutcome::Verified)
                }
                Some(_) => Ok(EmailVerifyOutcome::Invalid),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    fn db_with_user() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .create_user("carla", "c@x.com", "hash", None, None, true)
            .unwrap();
        (db, id)
    }

    #[test]
    fn issued_token_expires_fifteen_minutes_after_creation() {
        let (db, uid) = db_with_user();
        db.insert_auth_token(AccountKind::User, uid, "12345").unwrap();

        let minutes: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT CAST(ROUND((julianday(expires_at) - julianday(created_at)) * 24 * 60) AS INTEGER)
                     FROM auth_tokens WHERE token = '12345'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(minutes, 15);
    }

    #[test]
    fn verify_is_single_use() {
        let (db, uid) = db_with_user();
        db.insert_auth_token(AccountKind::User, uid, "54321").unwrap();

        assert_eq!(db.verify_auth_token("54321").unwrap(), VerifyOutcome::Valid);
        // Second attempt still finds the row by value, so it is
        // expired-or-used, not not-found.
        assert_eq!(
            db.verify_auth_token("54321").unwrap(),
            VerifyOutcome::ExpiredOrUsed
        );
    }

    #[test]
    fn expired_token_is_warning_not_success() {
        let (db, uid) = db_with_user();
        db.insert_auth_token_expiring(AccountKind::User, uid, "99999", -1)
            .unwrap();

        assert_eq!(
            db.verify_auth_token("99999").unwrap(),
            VerifyOutcome::ExpiredOrUsed
        );
    }

    #[test]
    fn unknown_token_is_not_found() {
        let (db, _) = db_with_user();
        assert_eq!(db.verify_auth_token("00000").unwrap(), VerifyOutcome::NotFound);
    }

    #[test]
    fn concurrent_pins_stay_independently_valid() {
        let (db, uid) = db_with_user();
        db.insert_auth_token(AccountKind::User, uid, "11111").unwrap();
        db.insert_auth_token(AccountKind::User, uid, "22222").unwrap();

        // Consuming one PIN does not invalidate the other.
        assert_eq!(db.verify_auth_token("22222").unwrap(), VerifyOutcome::Valid);
        assert_eq!(db.verify_auth_token("11111").unwrap(), VerifyOutcome::Valid);
    }

    #[test]
    fn email_verification_is_idempotent_but_informative() {
        let db = Database::open_in_memory().unwrap();
        db.create_admin("alice", "a@x.com", "hash", "tok-1").unwrap();

        assert_eq!(
            db.verify_admin_email("a@x.com", "wrong").unwrap(),
            EmailVerifyOutcome::Invalid
        );
        assert_eq!(
            db.verify_admin_email("a@x.com", "tok-1").unwrap(),
            EmailVerifyOutcome::Verified
        );
        assert_eq!(
            db.verify_admin_email("a@x.com", "tok-1").unwrap(),
            EmailVerifyOutcome::AlreadyVerified
        );

        let admin = db.get_admin_by_email("a@x.com").unwrap().unwrap();
        assert!(admin.email_verified);
        assert!(admin.active);
    }

    #[test]
    fn email_verification_unknown_account_is_invalid() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(
            db.verify_admin_email("ghost@x.com", "tok").unwrap(),
            EmailVerifyOutcome::Invalid
        );
    }
}
