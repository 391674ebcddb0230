//! Named store management.
//!
//! The storage holds any number of named stores; the proxy keeps exactly one of
//! them current and purges the rest on activation.

use super::connection::CacheDb;
use super::entries::RawEntry;
use super::key::RequestKey;
use super::response::StoredResponse;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Handle to one named store.
///
/// Holds no open resources beyond the shared connection, so handles are cheap
/// to obtain per operation and may outlive the store itself; operations on a
/// deleted store fail or match nothing.
#[derive(Clone, Debug)]
pub struct Store {
    pub(crate) db: CacheDb,
    pub(crate) id: i64,
    pub(crate) name: String,
}

impl Store {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CacheDb {
    /// Open a store, creating it if it doesn't exist.
    pub async fn open_store(&self, name: &str) -> Result<Store, Error> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("store name cannot be empty".into()));
        }

        let cache_name = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        let id = self
            .conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO cache_storage (cache_name, created_at) VALUES (?1, ?2)",
                    params![cache_name, created_at],
                )?;
                let id = conn.query_row(
                    "SELECT id FROM cache_storage WHERE cache_name = ?1",
                    params![cache_name],
                    |row| row.get(0),
                )?;
                Ok(id)
            })
            .await
            .map_err(Error::from)?;

        Ok(Store { db: self.clone(), id, name: name.to_string() })
    }

    /// Open an existing store without creating it.
    pub async fn existing_store(&self, name: &str) -> Result<Option<Store>, Error> {
        let cache_name = name.to_string();
        let id = self
            .conn
            .call(move |conn| -> Result<Option<i64>, Error> {
                match conn.query_row(
                    "SELECT id FROM cache_storage WHERE cache_name = ?1",
                    params![cache_name],
                    |row| row.get(0),
                ) {
                    Ok(id) => Ok(Some(id)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        Ok(id.map(|id| Store { db: self.clone(), id, name: name.to_string() }))
    }

    /// Check whether a store with the given name exists.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let cache_name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_storage WHERE cache_name = ?1)",
                    params![cache_name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// List store names in creation order.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT cache_name FROM cache_storage ORDER BY id ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and every entry in it.
    ///
    /// Returns false if no store had that name.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let cache_name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_storage WHERE cache_name = ?1", params![cache_name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Look a request up across every store, oldest store first.
    pub async fn match_any(&self, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        let request_url = key.as_str().to_string();
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<RawEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.response_url, e.status, e.status_text, e.response_type,
                            e.headers_json, e.body, e.stored_at
                     FROM cache_entries e
                     JOIN cache_storage s ON s.id = e.cache_id
                     WHERE e.request_url = ?1
                     ORDER BY s.id ASC
                     LIMIT 1",
                )?;
                match stmt.query_row(params![request_url], RawEntry::from_row) {
                    Ok(raw) => Ok(Some(raw)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        raw.map(StoredResponse::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::response::ResponseType;
    use url::Url;

    fn key(s: &str) -> RequestKey {
        RequestKey::from_url(&Url::parse(s).unwrap())
    }

    fn page(body: &str) -> StoredResponse {
        StoredResponse {
            url: "http://localhost:8080/index.html".into(),
            status: 200,
            status_text: "OK".into(),
            response_type: ResponseType::Basic,
            headers: vec![("content-type".into(), "text/html".into())],
            body: body.as_bytes().to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_open_creates_once() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let a = db.open_store("so-v4").await.unwrap();
        let b = db.open_store("so-v4").await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(db.store_names().await.unwrap(), vec!["so-v4".to_string()]);
    }

    #[tokio::test]
    async fn test_open_empty_name_rejected() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.open_store("  ").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_store_names_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("so-v2").await.unwrap();
        db.open_store("so-v4").await.unwrap();
        db.open_store("so-v3").await.unwrap();
        assert_eq!(db.store_names().await.unwrap(), vec!["so-v2", "so-v4", "so-v3"]);
    }

    #[tokio::test]
    async fn test_has_and_existing_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(!db.has_store("so-v4").await.unwrap());
        assert!(db.existing_store("so-v4").await.unwrap().is_none());

        db.open_store("so-v4").await.unwrap();
        assert!(db.has_store("so-v4").await.unwrap());
        assert!(db.existing_store("so-v4").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_store_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("so-v3").await.unwrap();
        let k = key("http://localhost:8080/index.html");
        store.put(&k, &page("old")).await.unwrap();

        assert!(db.delete_store("so-v3").await.unwrap());
        assert!(!db.delete_store("so-v3").await.unwrap());
        assert!(db.match_any(&k).await.unwrap().is_none());

        let count: i64 = db
            .conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let k = key("http://localhost:8080/index.html");
        db.open_store("so-v3").await.unwrap().put(&k, &page("v3")).await.unwrap();
        db.open_store("so-v4").await.unwrap().put(&k, &page("v4")).await.unwrap();

        let found = db.match_any(&k).await.unwrap().unwrap();
        assert_eq!(found.body, b"v3");

        db.delete_store("so-v3").await.unwrap();
        let found = db.match_any(&k).await.unwrap().unwrap();
        assert_eq!(found.body, b"v4");
    }
}
