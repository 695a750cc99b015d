use super::DocStore;
use crate::{
    error::{ReconError, ReconResult},
    types::Collection,
};
use rusqlite::{params, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

impl DocStore {
    // ── Documents ─────────────────────────────────────────────────

    /// Insert every document or none. Fails on a duplicate key.
    pub fn insert_many<T: Serialize>(&self, collection: Collection, docs: &[T]) -> ReconResult<usize> {
        let key_field = collection.key_field();
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO document (collection, doc_key, body) VALUES (?1, ?2, ?3)",
            )?;
            for doc in docs {
                let value = serde_json::to_value(doc)?;
                let key = value
                    .get(key_field)
                    .and_then(|k| k.as_str())
                    .ok_or_else(|| ReconError::MissingKey {
                        collection: collection.name().to_string(),
                        field: key_field.to_string(),
                    })?;
                stmt.execute(params![collection.name(), key, value.to_string()])?;
            }
        }
        tx.commit()?;
        log::debug!("inserted {} documents into '{}'", docs.len(), collection.name());
        Ok(docs.len())
    }

    /// Full-collection read in insertion order.
    pub fn find_all<T: DeserializeOwned>(&self, collection: Collection) -> ReconResult<Vec<T>> {
        let mut stmt = self.conn.prepare(
            "SELECT body FROM document WHERE collection = ?1 ORDER BY rowid ASC",
        )?;
        let bodies = stmt
            .query_map(params![collection.name()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|body| decode(collection, body))
            .collect()
    }

    pub fn find_one<T: DeserializeOwned>(&self, collection: Collection, key: &str) -> ReconResult<Option<T>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM document WHERE collection = ?1 AND doc_key = ?2",
                params![collection.name(), key],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|b| decode(collection, &b)).transpose()
    }

    pub fn count(&self, collection: Collection) -> ReconResult<i64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM document WHERE collection = ?1",
            params![collection.name()],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}

fn decode<T: DeserializeOwned>(collection: Collection, body: &str) -> ReconResult<T> {
    serde_json::from_str(body).map_err(|source| ReconError::MalformedDocument {
        collection: collection.name().to_string(),
        source,
    })
}
