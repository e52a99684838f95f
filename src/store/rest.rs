//! REST document store backend.
//!
//! Talks to the document service's JSON API at
//! `/users/{uid}/lands[/{land}]/crops[/{crop}]` paths. The service owns the
//! documents entirely; this client only (de)serializes our record types.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::StoreError;
use crate::flows::guidance::CropGuidance;

use super::{CropRecord, DocumentStore, LandRecord};

/// Document store client over plain JSON REST.
pub struct RestDocumentStore {
    http: reqwest::Client,
    base_url: String,
}

impl RestDocumentStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// GET a document; a 404 becomes `Ok(None)`.
    async fn get_doc<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        debug!(path, "store get");
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Http {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .await
            .map(Some)
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, StoreError> {
        Ok(self.get_doc(path).await?.unwrap_or_default())
    }

    async fn put_doc<T: Serialize>(&self, path: &str, doc: &T) -> Result<(), StoreError> {
        debug!(path, "store put");
        let resp = self
            .http
            .put(self.url(path))
            .json(doc)
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn list_lands(&self, uid: &str) -> Result<Vec<LandRecord>, StoreError> {
        self.get_list(&format!("users/{uid}/lands")).await
    }

    async fn get_land(&self, uid: &str, land_id: &str) -> Result<Option<LandRecord>, StoreError> {
        self.get_doc(&format!("users/{uid}/lands/{land_id}")).await
    }

    async fn put_land(&self, uid: &str, land: &LandRecord) -> Result<(), StoreError> {
        self.put_doc(&format!("users/{uid}/lands/{}", land.id), land)
            .await
    }

    async fn list_crops(&self, uid: &str, land_id: &str) -> Result<Vec<CropRecord>, StoreError> {
        self.get_list(&format!("users/{uid}/lands/{land_id}/crops"))
            .await
    }

    async fn get_crop(
        &self,
        uid: &str,
        land_id: &str,
        crop_id: &str,
    ) -> Result<Option<CropRecord>, StoreError> {
        self.get_doc(&format!("users/{uid}/lands/{land_id}/crops/{crop_id}"))
            .await
    }

    async fn put_crop(
        &self,
        uid: &str,
        land_id: &str,
        crop: &CropRecord,
    ) -> Result<(), StoreError> {
        self.put_doc(
            &format!("users/{uid}/lands/{land_id}/crops/{}", crop.id),
            crop,
        )
        .await
    }

    async fn get_guidance(
        &self,
        uid: &str,
        land_id: &str,
        crop_id: &str,
    ) -> Result<Option<CropGuidance>, StoreError> {
        self.get_doc(&format!(
            "users/{uid}/lands/{land_id}/crops/{crop_id}/guidance"
        ))
        .await
    }

    async fn put_guidance(
        &self,
        uid: &str,
        land_id: &str,
        crop_id: &str,
        guidance: &CropGuidance,
    ) -> Result<(), StoreError> {
        self.put_doc(
            &format!("users/{uid}/lands/{land_id}/crops/{crop_id}/guidance"),
            guidance,
        )
        .await
    }
}
