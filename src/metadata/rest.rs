//! PostgREST implementation of the metadata store.
//!
//! Operates against a Supabase project's REST endpoint. Two tables:
//! `gallery_locations` (one row per location) and `gallery_covers` (one row
//! per cover selection, keyed by the encoded cover key).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::warn;

use super::{CoverKey, Error, LocationRecord, LocationUpdate, MetadataStore, Result, StoredCover};

const LOCATIONS_TABLE: &str = "gallery_locations";
const COVERS_TABLE: &str = "gallery_covers";

/// Characters escaped inside a query-string filter value.
const FILTER_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

fn encode_filter_value(value: &str) -> String {
    utf8_percent_encode(value, FILTER_VALUE).to_string()
}

async fn read_error(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) if !body.is_empty() => format!("{}: {}", status, body),
        _ => status.to_string(),
    }
}

/// Metadata store backed by a PostgREST endpoint.
pub struct RestMetadataStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestMetadataStore {
    /// Create a new store for the given project URL and API key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Create a new store with a custom reqwest client.
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn locations_url(&self) -> String {
        format!(
            "{}?select=*&order=continent_name.asc,name.asc",
            self.table_url(LOCATIONS_TABLE)
        )
    }

    fn location_by_id_url(&self, id: &str) -> String {
        format!(
            "{}?id=eq.{}",
            self.table_url(LOCATIONS_TABLE),
            encode_filter_value(id)
        )
    }

    fn covers_url(&self) -> String {
        format!("{}?select=*", self.table_url(COVERS_TABLE))
    }

    fn cover_by_key_url(&self, encoded_key: &str) -> String {
        format!(
            "{}?location_key=eq.{}",
            self.table_url(COVERS_TABLE),
            encode_filter_value(encoded_key)
        )
    }

    fn cover_upsert_url(&self) -> String {
        format!("{}?on_conflict=location_key", self.table_url(COVERS_TABLE))
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl MetadataStore for RestMetadataStore {
    async fn locations(&self) -> Result<Vec<LocationRecord>> {
        let response = self
            .request(self.client.get(self.locations_url()))
            .send()
            .await
            .map_err(|e| Error::Other(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let records: Vec<LocationRecord> = response
                    .json()
                    .await
                    .map_err(|e| Error::Other(format!("failed to parse locations: {}", e)))?;
                Ok(records)
            }
            _ => Err(Error::Other(format!(
                "failed to fetch locations: {}",
                read_error(response).await
            ))),
        }
    }

    async fn insert_location(&self, record: &LocationRecord) -> Result<()> {
        let response = self
            .request(self.client.post(self.table_url(LOCATIONS_TABLE)))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| Error::Other(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "failed to insert location: {}",
                read_error(response).await
            )))
        }
    }

    async fn update_location(&self, id: &str, update: &LocationUpdate) -> Result<()> {
        // Ask for the updated rows back so a missing id is detectable.
        let response = self
            .request(self.client.patch(self.location_by_id_url(id)))
            .header("Prefer", "return=representation")
            .json(update)
            .send()
            .await
            .map_err(|e| Error::Other(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Other(format!(
                "failed to update location: {}",
                read_error(response).await
            )));
        }

        let updated: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| Error::Other(format!("failed to parse update response: {}", e)))?;
        if updated.is_empty() {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete_location(&self, id: &str) -> Result<()> {
        let response = self
            .request(self.client.delete(self.location_by_id_url(id)))
            .header("Prefer", "return=minimal")
            .send()
            .await
            .map_err(|e| Error::Other(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "failed to delete location: {}",
                read_error(response).await
            )))
        }
    }

    async fn covers(&self) -> Result<HashMap<CoverKey, String>> {
        let response = self
            .request(self.client.get(self.covers_url()))
            .send()
            .await
            .map_err(|e| Error::Other(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Other(format!(
                "failed to fetch covers: {}",
                read_error(response).await
            )));
        }

        let rows: Vec<StoredCover> = response
            .json()
            .await
            .map_err(|e| Error::Other(format!("failed to parse covers: {}", e)))?;

        let mut covers = HashMap::with_capacity(rows.len());
        for row in rows {
            match CoverKey::decode(&row.location_key) {
                Some(key) => {
                    covers.insert(key, row.cover_url);
                }
                None => warn!(key = %row.location_key, "skipping malformed cover key"),
            }
        }
        Ok(covers)
    }

    async fn set_cover(&self, key: &CoverKey, url: &str) -> Result<()> {
        let row = StoredCover {
            location_key: key.encode(),
            cover_url: url.to_string(),
            updated_at: Some(Utc::now()),
        };

        let response = self
            .request(self.client.post(self.cover_upsert_url()))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| Error::Other(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "failed to set cover: {}",
                read_error(response).await
            )))
        }
    }

    async fn remove_cover(&self, key: &CoverKey) -> Result<()> {
        let response = self
            .request(self.client.delete(self.cover_by_key_url(&key.encode())))
            .header("Prefer", "return=minimal")
            .send()
            .await
            .map_err(|e| Error::Other(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "failed to remove cover: {}",
                read_error(response).await
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_filter_value() {
        assert_eq!(encode_filter_value("africa-masai-mara"), "africa-masai-mara");
        assert_eq!(
            encode_filter_value("Africa/Masai Mara"),
            "Africa%2FMasai%20Mara"
        );
        assert_eq!(encode_filter_value("50%+fun"), "50%25%2Bfun");
    }

    #[test]
    fn test_url_builders() {
        let store = RestMetadataStore::new("https://project.supabase.co/", "anon-key");
        assert_eq!(
            store.locations_url(),
            "https://project.supabase.co/rest/v1/gallery_locations?select=*&order=continent_name.asc,name.asc"
        );
        assert_eq!(
            store.location_by_id_url("africa-masai-mara"),
            "https://project.supabase.co/rest/v1/gallery_locations?id=eq.africa-masai-mara"
        );
        assert_eq!(
            store.cover_by_key_url("Africa/Masai Mara"),
            "https://project.supabase.co/rest/v1/gallery_covers?location_key=eq.Africa%2FMasai%20Mara"
        );
        assert_eq!(
            store.cover_upsert_url(),
            "https://project.supabase.co/rest/v1/gallery_covers?on_conflict=location_key"
        );
    }

    #[test]
    fn test_stored_cover_omits_missing_updated_at() {
        let row = StoredCover {
            location_key: "Africa/Masai Mara".to_string(),
            cover_url: "https://ik.imagekit.io/acct/lion.jpg".to_string(),
            updated_at: None,
        };
        let raw = serde_json::to_string(&row).unwrap();
        assert!(!raw.contains("updated_at"));
    }
}
