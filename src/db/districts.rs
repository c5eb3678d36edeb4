use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bson::doc;
use futures::TryStreamExt;
use mongodb::{options::FindOptions, Client, Collection};

use super::trip_store::StoreError;
use crate::models::district::District;

/// Read-only view of the district catalog.
#[async_trait]
pub trait DistrictDirectory: Send + Sync {
    async fn find_districts(&self, ids: &[i64]) -> Result<Vec<District>, StoreError>;

    /// Districts whose name starts with `search` (case-insensitive), sorted by name.
    async fn list_districts(
        &self,
        search: Option<&str>,
        limit: Option<u16>,
    ) -> Result<Vec<District>, StoreError>;
}

/// Display names for `ids`, in the order requested. Unknown ids are skipped.
pub fn names_in_order(ids: &[i64], districts: &[District]) -> Vec<String> {
    ids.iter()
        .filter_map(|id| {
            districts
                .iter()
                .find(|district| district.district_id == *id)
                .map(|district| district.district_name.clone())
        })
        .collect()
}

pub fn name_map(districts: &[District]) -> BTreeMap<i64, String> {
    districts
        .iter()
        .map(|district| (district.district_id, district.district_name.clone()))
        .collect()
}

pub struct MongoDistrictDirectory {
    client: Arc<Client>,
    database: String,
}

impl MongoDistrictDirectory {
    pub fn new(client: Arc<Client>, database: impl Into<String>) -> Self {
        Self {
            client,
            database: database.into(),
        }
    }

    fn districts(&self) -> Collection<District> {
        self.client.database(&self.database).collection("District")
    }
}

#[async_trait]
impl DistrictDirectory for MongoDistrictDirectory {
    async fn find_districts(&self, ids: &[i64]) -> Result<Vec<District>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let districts = self
            .districts()
            .find(doc! { "district_id": { "$in": ids.to_vec() } })
            .await?
            .try_collect()
            .await?;
        Ok(districts)
    }

    async fn list_districts(
        &self,
        search: Option<&str>,
        limit: Option<u16>,
    ) -> Result<Vec<District>, StoreError> {
        let mut options = FindOptions::default();
        options.sort = Some(doc! { "district_name": 1 });
        if let Some(limit) = limit {
            options.limit = Some(limit.into());
        }

        let filter = match search {
            Some(search_text) if !search_text.is_empty() => doc! {
                "district_name": {
                    "$regex": format!("^{}", regex::escape(search_text)),
                    "$options": "i"
                }
            },
            _ => doc! {},
        };

        let districts = self
            .districts()
            .find(filter)
            .with_options(options)
            .await?
            .try_collect()
            .await?;
        Ok(districts)
    }
}
