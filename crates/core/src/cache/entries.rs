//! Entry operations on a single store: match, put, delete, keys.

use super::key::{RequestKey, compute_entry_key};
use super::response::StoredResponse;
use super::storage::Store;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

const UPSERT_ENTRY: &str = "INSERT INTO cache_entries (
        entry_key, cache_id, request_url, response_url, status, status_text,
        response_type, headers_json, body, stored_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT(entry_key) DO UPDATE SET
        response_url = excluded.response_url,
        status = excluded.status,
        status_text = excluded.status_text,
        response_type = excluded.response_type,
        headers_json = excluded.headers_json,
        body = excluded.body,
        stored_at = excluded.stored_at";

/// Row shape shared by every query that reads a response back.
pub(crate) struct RawEntry {
    response_url: String,
    status: u16,
    status_text: String,
    response_type: String,
    headers_json: String,
    body: Vec<u8>,
    stored_at: String,
}

impl RawEntry {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            response_url: row.get(0)?,
            status: row.get(1)?,
            status_text: row.get(2)?,
            response_type: row.get(3)?,
            headers_json: row.get(4)?,
            body: row.get(5)?,
            stored_at: row.get(6)?,
        })
    }
}

impl TryFrom<RawEntry> for StoredResponse {
    type Error = Error;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        Ok(StoredResponse {
            url: raw.response_url,
            status: raw.status,
            status_text: raw.status_text,
            response_type: raw.response_type.parse().map_err(Error::Serialization)?,
            headers: serde_json::from_str(&raw.headers_json)?,
            body: raw.body,
            stored_at: raw.stored_at,
        })
    }
}

impl Store {
    /// Look up a request in this store.
    pub async fn match_request(&self, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        let entry_key = compute_entry_key(&self.name, key);
        let raw = self
            .db
            .conn
            .call(move |conn| -> Result<Option<RawEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT response_url, status, status_text, response_type, headers_json, body, stored_at
                     FROM cache_entries WHERE entry_key = ?1",
                )?;
                match stmt.query_row(params![entry_key], RawEntry::from_row) {
                    Ok(raw) => Ok(Some(raw)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        raw.map(StoredResponse::try_from).transpose()
    }

    /// Store a response for a request, replacing any previous one.
    pub async fn put(&self, key: &RequestKey, response: &StoredResponse) -> Result<(), Error> {
        self.put_all(vec![(key.clone(), response.clone())]).await
    }

    /// Store several responses in one transaction: either all land or none do.
    pub async fn put_all(&self, entries: Vec<(RequestKey, StoredResponse)>) -> Result<(), Error> {
        let cache_id = self.id;
        let rows = entries
            .into_iter()
            .map(|(key, response)| -> Result<_, Error> {
                let headers_json = serde_json::to_string(&response.headers)?;
                Ok((compute_entry_key(&self.name, &key), key.as_str().to_string(), headers_json, response))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(UPSERT_ENTRY)?;
                    for (entry_key, request_url, headers_json, response) in &rows {
                        stmt.execute(params![
                            entry_key,
                            cache_id,
                            request_url,
                            &response.url,
                            response.status,
                            &response.status_text,
                            response.response_type.as_str(),
                            headers_json,
                            &response.body,
                            &response.stored_at,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove the entry for a request. Returns false if there was none.
    pub async fn delete(&self, key: &RequestKey) -> Result<bool, Error> {
        let entry_key = compute_entry_key(&self.name, key);
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_entries WHERE entry_key = ?1", params![entry_key])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Request URLs held by this store, in first-insertion order.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        let cache_id = self.id;
        self.db
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT request_url FROM cache_entries WHERE cache_id = ?1 ORDER BY rowid ASC")?;
                let keys = stmt
                    .query_map(params![cache_id], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in this store.
    pub async fn len(&self) -> Result<u64, Error> {
        let cache_id = self.id;
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_entries WHERE cache_id = ?1", params![cache_id], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}
