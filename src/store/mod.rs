//! Document store — user → land → crop records and the guidance cache.
//!
//! The backing service is an external document database consumed over REST;
//! its only contract with this code is "typed record in, typed record out".
//! `MemoryStore` backs tests and deployments without a configured store.

mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::RestDocumentStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::flows::guidance::CropGuidance;

/// A farmer's land parcel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LandRecord {
    pub id: String,
    pub name: String,
    pub area_acres: f64,
    pub soil_type: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LandRecord {
    pub fn new(name: impl Into<String>, area_acres: f64, soil_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            area_acres,
            soil_type: soil_type.into(),
            latitude: None,
            longitude: None,
        }
    }
}

/// A crop sown on a land parcel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropRecord {
    pub id: String,
    pub crop_name: String,
    pub variety: Option<String>,
    pub sowing_date: NaiveDate,
}

impl CropRecord {
    pub fn new(crop_name: impl Into<String>, sowing_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            crop_name: crop_name.into(),
            variety: None,
            sowing_date,
        }
    }
}

/// Backend-agnostic document store over the user → land → crop hierarchy.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ── Lands ───────────────────────────────────────────────────────

    async fn list_lands(&self, uid: &str) -> Result<Vec<LandRecord>, StoreError>;

    async fn get_land(&self, uid: &str, land_id: &str) -> Result<Option<LandRecord>, StoreError>;

    async fn put_land(&self, uid: &str, land: &LandRecord) -> Result<(), StoreError>;

    // ── Crops ───────────────────────────────────────────────────────

    async fn list_crops(&self, uid: &str, land_id: &str) -> Result<Vec<CropRecord>, StoreError>;

    async fn get_crop(
        &self,
        uid: &str,
        land_id: &str,
        crop_id: &str,
    ) -> Result<Option<CropRecord>, StoreError>;

    async fn put_crop(
        &self,
        uid: &str,
        land_id: &str,
        crop: &CropRecord,
    ) -> Result<(), StoreError>;

    // ── Guidance cache ──────────────────────────────────────────────

    /// Previously generated guidance for a crop, if cached.
    async fn get_guidance(
        &self,
        uid: &str,
        land_id: &str,
        crop_id: &str,
    ) -> Result<Option<CropGuidance>, StoreError>;

    /// Cache generated guidance for reuse on later requests.
    async fn put_guidance(
        &self,
        uid: &str,
        land_id: &str,
        crop_id: &str,
        guidance: &CropGuidance,
    ) -> Result<(), StoreError>;
}
