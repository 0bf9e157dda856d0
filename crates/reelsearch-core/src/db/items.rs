//! Catalog item storage

use super::Database;
use crate::error::{ReelSearchError, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// A catalog entry backing both search indexes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: String,
    pub modified_at: String,
}

impl Item {
    /// Text shown to the judge and fed to the embedder
    pub fn context_text(&self) -> String {
        format!("{}. {}", self.title, self.description)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get(3)?,
            modified_at: row.get(4)?,
        })
    }
}

const ITEM_COLUMNS: &str = "id, title, description, created_at, modified_at";

impl Database {
    /// Insert a new item; fails if the id is taken
    pub fn insert_item(&self, id: i64, title: &str, description: &str) -> Result<Item> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM items WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        if exists {
            return Err(ReelSearchError::InvalidInput(format!(
                "Item {} already exists",
                id
            )));
        }

        conn.execute(
            "INSERT INTO items (id, title, description, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![id, title, description, now],
        )?;

        Ok(Item {
            id,
            title: title.to_string(),
            description: description.to_string(),
            created_at: now.clone(),
            modified_at: now,
        })
    }

    /// Get item by id
    pub fn get_item(&self, id: i64) -> Result<Option<Item>> {
        let item = self
            .conn()?
            .query_row(
                &format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS),
                params![id],
                Item::from_row,
            )
            .optional()?;
        Ok(item)
    }

    /// Get items for the given ids, in request order; unknown ids are skipped
    pub fn list_items(&self, ids: &[i64]) -> Result<Vec<Item>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS))?;

        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(item) = stmt.query_row(params![id], Item::from_row).optional()? {
                items.push(item);
            } else {
                tracing::debug!("Item {} not found", id);
            }
        }
        Ok(items)
    }

    /// List every item ordered by id
    pub fn list_all_items(&self) -> Result<Vec<Item>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM items ORDER BY id", ITEM_COLUMNS))?;
        let items = stmt
            .query_map([], Item::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Update title and/or description; stored vectors for the item are dropped
    pub fn update_item(
        &self,
        id: i64,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Item> {
        let existing = self.get_item(id)?.ok_or(ReelSearchError::ItemNotFound(id))?;

        let updated = Item {
            id,
            title: title.unwrap_or(&existing.title).to_string(),
            description: description.unwrap_or(&existing.description).to_string(),
            created_at: existing.created_at,
            modified_at: Utc::now().to_rfc3339(),
        };

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE items SET title = ?2, description = ?3, modified_at = ?4 WHERE id = ?1",
            params![id, updated.title, updated.description, updated.modified_at],
        )?;
        tx.execute("DELETE FROM item_vectors WHERE item_id = ?1", params![id])?;
        tx.commit()?;

        Ok(updated)
    }

    /// Delete an item and its vectors; returns whether a row was removed
    pub fn delete_item(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM item_vectors WHERE item_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM items WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    /// Count catalog items
    pub fn item_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    #[test]
    fn test_insert_and_get() {
        let db = test_db();
        let item = db
            .insert_item(60, "Ada Apa Dengan Cinta", "A poetry-loving teenager falls in love.")
            .unwrap();

        let fetched = db.get_item(60).unwrap().unwrap();
        assert_eq!(fetched, item);
        assert_eq!(
            fetched.context_text(),
            "Ada Apa Dengan Cinta. A poetry-loving teenager falls in love."
        );
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let db = test_db();
        db.insert_item(1, "A", "first").unwrap();
        let err = db.insert_item(1, "B", "second").unwrap_err();
        assert!(matches!(err, ReelSearchError::InvalidInput(_)));
    }

    #[test]
    fn test_list_items_keeps_request_order() {
        let db = test_db();
        db.insert_item(1, "One", "first").unwrap();
        db.insert_item(2, "Two", "second").unwrap();
        db.insert_item(3, "Three", "third").unwrap();

        let items = db.list_items(&[3, 99, 1]).unwrap();
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_update_item_partial() {
        let db = test_db();
        db.insert_item(5, "Old title", "Old description").unwrap();

        let updated = db.update_item(5, None, Some("New description")).unwrap();
        assert_eq!(updated.title, "Old title");
        assert_eq!(updated.description, "New description");

        let fetched = db.get_item(5).unwrap().unwrap();
        assert_eq!(fetched.description, "New description");
    }

    #[test]
    fn test_update_missing_item() {
        let db = test_db();
        let err = db.update_item(42, Some("x"), None).unwrap_err();
        assert!(matches!(err, ReelSearchError::ItemNotFound(42)));
    }

    #[test]
    fn test_delete_item() {
        let db = test_db();
        db.insert_item(7, "Gone", "soon").unwrap();
        assert!(db.delete_item(7).unwrap());
        assert!(!db.delete_item(7).unwrap());
        assert!(db.get_item(7).unwrap().is_none());
        assert_eq!(db.item_count().unwrap(), 0);
    }
}
