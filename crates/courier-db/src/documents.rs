use crate::Database;
use crate::models::DocumentRow;
use anyhow::Result;
use rusqlite::{OptionalExtension, Row};

fn document_from_row(row: &Row) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        client_id: row.get(1)?,
        file_name: row.get(2)?,
        stored_path: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl Database {
    pub fn insert_document(
        &self,
        client_id: i64,
        file_name: &str,
        stored_path: &str,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO documents (client_id, file_name, stored_path) VALUES (?1, ?2, ?3)",
                (client_id, file_name, stored_path),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_documents_for_client(&self, client_id: i64) -> Result<Vec<DocumentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, client_id, file_name, stored_path, created_at
                 FROM documents WHERE client_id = ?1 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([client_id], document_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_document(&self, id: i64) -> Result<Option<DocumentRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, client_id, file_name, stored_path, created_at
                     FROM documents WHERE id = ?1",
                    [id],
                    document_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_document(&self, id: i64) -> Result<usize> {
        self.with_conn_mut(|conn| Ok(conn.execute("DELETE FROM documents WHERE id = ?1", [id])?))
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    #[test]
    fn documents_belong_to_a_client() {
        let db = Database::open_in_memory().unwrap();
        let client = db
            .create_client("Acme", None, "acme@x.com", None, None, true)
            .unwrap();

        let id = db
            .insert_document(client, "contrato.pdf", "uploads/abc.pdf")
            .unwrap();
        assert_eq!(db.list_documents_for_client(client).unwrap().len(), 1);
        assert_eq!(db.get_document(id).unwrap().unwrap().file_name, "contrato.pdf");
        assert_eq!(db.delete_document(id).unwrap(), 1);
        assert_eq!(db.delete_document(id).unwrap(), 0);

        // No orphan documents.
        assert!(db.insert_document(999, "x.pdf", "uploads/x.pdf").is_err());
    }
}
