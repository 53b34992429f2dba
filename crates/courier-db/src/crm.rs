use crate::Database;
use crate::models::{ClientRow, ContactRow, GroupMemberRow, GroupRow, TemplateRow};
use anyhow::Result;
use rusqlite::{OptionalExtension, Row};

fn client_from_row(row: &Row) -> rusqlite::Result<ClientRow> {
    Ok(ClientRow {
        id: row.get(0)?,
        name: row.get(1)?,
        rep_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        active: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const CLIENT_COLUMNS: &str = "id, name, rep_name, email, phone, address, active, created_at";

impl Database {
    // -- Clients --

    pub fn create_client(
        &self,
        name: &str,
        rep_name: Option<&str>,
        email: &str,
        phone: Option<&str>,
        address: Option<&str>,
        active: bool,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO clients (name, rep_name, email, phone, address, active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (name, rep_name, email, phone, address, active),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_clients(&self) -> Result<Vec<ClientRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map([], client_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_client(&self, id: i64) -> Result<Option<ClientRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1"),
                    [id],
                    client_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Returns the affected row count; zero means no such client.
    pub fn update_client(
        &self,
        id: i64,
        name: &str,
        rep_name: Option<&str>,
        email: &str,
        phone: Option<&str>,
        address: Option<&str>,
        active: bool,
    ) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE clients
                 SET name = ?2, rep_name = ?3, email = ?4, phone = ?5, address = ?6, active = ?7
                 WHERE id = ?1",
                (id, name, rep_name, email, phone, address, active),
            )?;
            Ok(n)
        })
    }

    pub fn delete_client(&self, id: i64) -> Result<usize> {
        self.with_conn_mut(|conn| Ok(conn.execute("DELETE FROM clients WHERE id = ?1", [id])?))
    }

    // -- Contacts --

    pub fn create_contact(&self, name: &str, phone_number: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO contacts (name, phone_number) VALUES (?1, ?2)",
                (name, phone_number),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_contacts(&self) -> Result<Vec<ContactRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, phone_number, created_at FROM contacts ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ContactRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        phone_number: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Groups --

    /// Create a group and its memberships in one transaction, so a bad
    /// contact id leaves no half-created group behind.
    pub fn create_group_with_contacts(&self, name: &str, contact_ids: &[i64]) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("INSERT INTO contact_groups (name) VALUES (?1)", [name])?;
            let group_id = tx.last_insert_rowid();
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO group_contacts (group_id, contact_id) VALUES (?1, ?2)",
                )?;
                for contact_id in contact_ids {
                    stmt.execute((group_id, contact_id))?;
                }
            }
            tx.commit()?;
            Ok(group_id)
        })
    }

    pub fn list_groups(&self) -> Result<Vec<GroupRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, created_at FROM contact_groups ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(GroupRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Resolve a group's members (name, phone) for a bulk template send.
    /// Recipients are processed in the order this query returns them.
    pub fn get_group_members_by_name(&self, group_name: &str) -> Result<Vec<GroupMemberRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.name, c.phone_number
                 FROM contacts c
                 INNER JOIN group_contacts gc ON gc.contact_id = c.id
                 INNER JOIN contact_groups g ON g.id = gc.group_id
                 WHERE g.name = ?1
                 ORDER BY c.id",
            )?;
            let rows = stmt
                .query_map([group_name], |row| {
                    Ok(GroupMemberRow {
                        name: row.get(0)?,
                        phone_number: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_group_phones_by_id(&self, group_id: i64) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.phone_number
                 FROM group_contacts gc
                 INNER JOIN contacts c ON gc.contact_id = c.id
                 WHERE gc.group_id = ?1
                 ORDER BY c.id",
            )?;
            let rows = stmt
                .query_map([group_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Templates --

    pub fn create_template(&self, name: &str, content: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO templates (name, content) VALUES (?1, ?2)",
                (name, content),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_templates(&self) -> Result<Vec<TemplateRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, content, created_at FROM templates ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(TemplateRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        content: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_template(&self, id: i64, name: &str, content: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE templates SET name = ?2, content = ?3 WHERE id = ?1",
                (id, name, content),
            )?;
            Ok(n)
        })
    }

    pub fn delete_template(&self, id: i64) -> Result<usize> {
        self.with_conn_mut(|conn| Ok(conn.execute("DELETE FROM templates WHERE id = ?1", [id])?))
    }

    pub fn get_template_content_by_name(&self, name: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let content = conn
                .query_row(
                    "SELECT content FROM templates WHERE name = ?1",
                    [name],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(content)
        })
    }

    pub fn get_template_content_by_id(&self, id: i64) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let content = conn
                .query_row("SELECT content FROM templates WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(content)
        })
    }

    // -- Campaigns --

    pub fn insert_campaign(&self, group_id: i64, template_id: i64) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO campaigns (group_id, template_id) VALUES (?1, ?2)",
                (group_id, template_id),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    #[test]
    fn client_crud_affected_counts() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .create_client("Acme", Some("Ana"), "acme@x.com", None, None, true)
            .unwrap();

        assert_eq!(
            db.update_client(id, "Acme SA", Some("Ana"), "acme@x.com", None, None, true)
                .unwrap(),
            1
        );
        assert_eq!(db.get_client(id).unwrap().unwrap().name, "Acme SA");
        assert_eq!(db.update_client(999, "x", None, "y", None, None, true).unwrap(), 0);
        assert_eq!(db.delete_client(id).unwrap(), 1);
        assert!(db.get_client(id).unwrap().is_none());
    }

    #[test]
    fn group_members_resolve_in_insert_order() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_contact("Ana", "50761111111").unwrap();
        let b = db.create_contact("Beto", "50762222222").unwrap();
        let c = db.create_contact("Cleo", "50763333333").unwrap();
        db.create_group_with_contacts("vip", &[a, b, c]).unwrap();

        let members = db.get_group_members_by_name("vip").unwrap();
        let phones: Vec<_> = members.iter().map(|m| m.phone_number.as_str()).collect();
        assert_eq!(phones, vec!["50761111111", "50762222222", "50763333333"]);
    }

    #[test]
    fn unknown_group_resolves_to_no_members() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_group_members_by_name("nadie").unwrap().is_empty());
    }

    #[test]
    fn group_creation_is_transactional() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_contact("Ana", "50761111111").unwrap();

        // 999 violates the foreign key, so the group must not survive.
        assert!(db.create_group_with_contacts("mixto", &[a, 999]).is_err());
        assert!(db.list_groups().unwrap().is_empty());
    }

    #[test]
    fn template_update_and_delete_report_missing_rows() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_template("hello_world", "Hello!").unwrap();

        assert_eq!(db.update_template(id, "hello_world", "Hi!").unwrap(), 1);
        assert_eq!(db.update_template(999, "x", "y").unwrap(), 0);
        assert_eq!(
            db.get_template_content_by_name("hello_world").unwrap().as_deref(),
            Some("Hi!")
        );
        assert!(db.get_template_content_by_name("missing").unwrap().is_none());
        assert_eq!(db.delete_template(id).unwrap(), 1);
        assert_eq!(db.delete_template(id).unwrap(), 0);
    }

    #[test]
    fn duplicate_template_name_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_template("hello_world", "Hello!").unwrap();
        assert!(db.create_template("hello_world", "again").is_err());
    }
}
