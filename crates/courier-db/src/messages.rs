use crate::Database;
use crate::models::MessageRow;
use anyhow::Result;

impl Database {
    /// Append one row to the conversation log. Only confirmed outbound
    /// dispatches and received inbound texts land here.
    pub fn insert_message(
        &self,
        phone_number: &str,
        direction: &str,
        content: &str,
        message_type: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (phone_number, direction, content, message_type)
                 VALUES (?1, ?2, ?3, ?4)",
                (phone_number, direction, content, message_type),
            )?;
            Ok(())
        })
    }

    pub fn list_conversations(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT DISTINCT phone_number FROM messages")?;
            let rows = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_messages_for_number(&self, phone_number: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT phone_number, direction, content, message_type, created_at
                 FROM messages WHERE phone_number = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt
                .query_map([phone_number], |row| {
                    Ok(MessageRow {
                        phone_number: row.get(0)?,
                        direction: row.get(1)?,
                        content: row.get(2)?,
                        message_type: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_messages(&self) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(1) FROM messages", [], |row| row.get(0))?)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    #[test]
    fn history_is_append_only_and_ordered() {
        let db = Database::open_in_memory().unwrap();
        db.insert_message("50761111111", "outbound", "hola", "text").unwrap();
        db.insert_message("50761111111", "inbound", "buenas", "text").unwrap();
        db.insert_message("50762222222", "outbound", "Hola Ana", "template").unwrap();

        let history = db.get_messages_for_number("50761111111").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].direction, "outbound");
        assert_eq!(history[1].direction, "inbound");

        let mut conversations = db.list_conversations().unwrap();
        conversations.sort();
        assert_eq!(conversations, vec!["50761111111", "50762222222"]);
    }

    #[test]
    fn direction_and_type_are_constrained() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.insert_message("507", "sideways", "x", "text").is_err());
        assert!(db.insert_message("507", "inbound", "x", "carrier-pigeon").is_err());
    }
}
