/// Database row types — these map directly to SQLite rows.
/// Distinct from the courier-types API DTOs to keep the DB layer
/// independent of the wire shapes.

pub struct AdminRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
    pub email_verified: bool,
    pub created_at: String,
}

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub server_url: Option<String>,
    pub active: bool,
    pub created_at: String,
}

/// Which account table a PIN belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Admin,
    User,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountKind::Admin => "admin",
            AccountKind::User => "user",
        }
    }
}

/// Tri-state outcome of a PIN verification. A token that the lookup
/// still finds but that is spent or past its expiry is reported as
/// `ExpiredOrUsed`, never `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Valid,
    ExpiredOrUsed,
    NotFound,
}

/// Outcome of consuming an email-verification link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailVerifyOutcome {
    Verified,
    AlreadyVerified,
    Invalid,
}

pub struct ClientRow {
    pub id: i64,
    pub name: String,
    pub rep_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub active: bool,
    pub created_at: String,
}

pub struct ContactRow {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub created_at: String,
}

pub struct GroupRow {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

/// A group member as resolved by the bulk-send join query.
pub struct GroupMemberRow {
    pub name: String,
    pub phone_number: String,
}

pub struct TemplateRow {
    pub id: i64,
    pub name: String,
    pub content: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub phone_number: String,
    pub direction: String,
    pub content: String,
    pub message_type: String,
    pub created_at: String,
}

pub struct DocumentRow {
    pub id: i64,
    pub client_id: i64,
    pub file_name: String,
    pub stored_path: String,
    pub created_at: String,
}
