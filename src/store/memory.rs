//! In-memory document store for tests and store-less deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::flows::guidance::CropGuidance;

use super::{CropRecord, DocumentStore, LandRecord};

#[derive(Default)]
struct Inner {
    /// uid → land id → land.
    lands: HashMap<String, HashMap<String, LandRecord>>,
    /// (uid, land id) → crop id → crop.
    crops: HashMap<(String, String), HashMap<String, CropRecord>>,
    /// (uid, land id, crop id) → cached guidance.
    guidance: HashMap<(String, String, String), CropGuidance>,
}

/// Process-local store; contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_lands(&self, uid: &str) -> Result<Vec<LandRecord>, StoreError> {
        let inner = self.inner.read().await;
        let mut lands: Vec<LandRecord> = inner
            .lands
            .get(uid)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        lands.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(lands)
    }

    async fn get_land(&self, uid: &str, land_id: &str) -> Result<Option<LandRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.lands.get(uid).and_then(|m| m.get(land_id)).cloned())
    }

    async fn put_land(&self, uid: &str, land: &LandRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .lands
            .entry(uid.to_string())
            .or_default()
            .insert(land.id.clone(), land.clone());
        Ok(())
    }

    async fn list_crops(&self, uid: &str, land_id: &str) -> Result<Vec<CropRecord>, StoreError> {
        let inner = self.inner.read().await;
        let mut crops: Vec<CropRecord> = inner
            .crops
            .get(&(uid.to_string(), land_id.to_string()))
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        crops.sort_by(|a, b| a.sowing_date.cmp(&b.sowing_date));
        Ok(crops)
    }

    async fn get_crop(
        &self,
        uid: &str,
        land_id: &str,
        crop_id: &str,
    ) -> Result<Option<CropRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .crops
            .get(&(uid.to_string(), land_id.to_string()))
            .and_then(|m| m.get(crop_id))
            .cloned())
    }

    async fn put_crop(
        &self,
        uid: &str,
        land_id: &str,
        crop: &CropRecord,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .crops
            .entry((uid.to_string(), land_id.to_string()))
            .or_default()
            .insert(crop.id.clone(), crop.clone());
        Ok(())
    }

    async fn get_guidance(
        &self,
        uid: &str,
        land_id: &str,
        crop_id: &str,
    ) -> Result<Option<CropGuidance>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .guidance
            .get(&(uid.to_string(), land_id.to_string(), crop_id.to_string()))
            .cloned())
    }

    async fn put_guidance(
        &self,
        uid: &str,
        land_id: &str,
        crop_id: &str,
        guidance: &CropGuidance,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.guidance.insert(
            (uid.to_string(), land_id.to_string(), crop_id.to_string()),
            guidance.clone(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn land_and_crop_round_trip() {
        let store = MemoryStore::new();
        let land = LandRecord::new("North field", 2.5, "loam");
        store.put_land("u1", &land).await.unwrap();

        assert_eq!(store.list_lands("u1").await.unwrap(), vec![land.clone()]);
        assert_eq!(
            store.get_land("u1", &land.id).await.unwrap(),
            Some(land.clone())
        );
        assert_eq!(store.get_land("u2", &land.id).await.unwrap(), None);

        let sowing = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let crop = CropRecord::new("rice", sowing);
        store.put_crop("u1", &land.id, &crop).await.unwrap();
        assert_eq!(
            store.get_crop("u1", &land.id, &crop.id).await.unwrap(),
            Some(crop.clone())
        );
        assert!(store.list_crops("u1", "other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn guidance_cache_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get_guidance("u1", "l1", "c1").await.unwrap(), None);

        let guidance = CropGuidance {
            crop_name: "rice".to_string(),
            stages: vec![],
        };
        store
            .put_guidance("u1", "l1", "c1", &guidance)
            .await
            .unwrap();
        assert_eq!(
            store.get_guidance("u1", "l1", "c1").await.unwrap(),
            Some(guidance)
        );
    }
}
