use crate::error::StoreError;
use crate::model::{CanSee, DataType, Group, Location, PhyloRun, PhyloTree, Sample, User};
use crate::store::{Database, ObjectStore};
use async_trait::async_trait;
use log::warn;
use std::collections::{BTreeMap, BTreeSet};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two locations in kilometers (haversine).
fn haversine_km(a: &Location, b: &Location) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

// ----------------------------------------------------------------------------
// Memory Store

/// In-memory [`ObjectStore`] keyed by `(bucket, key)`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: BTreeMap<(String, String), Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` at `(bucket, key)`, replacing any previous object.
    pub fn put<B: Into<Vec<u8>>>(&mut self, bucket: &str, key: &str, bytes: B) {
        self.objects.insert((bucket.to_string(), key.to_string()), bytes.into());
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::ObjectMissing {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

// ----------------------------------------------------------------------------
// Memory Database

/// In-memory [`Database`] over plain entity vectors. Seed the public fields
/// directly.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub samples: Vec<Sample>,
    pub runs: Vec<PhyloRun>,
    pub trees: Vec<PhyloTree>,
    pub can_see: Vec<CanSee>,
    pub locations: Vec<Location>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn phylo_tree(&self, tree_id: i64) -> Result<Option<PhyloTree>, StoreError> {
        Ok(self.trees.iter().find(|tree| tree.id == tree_id).cloned())
    }

    async fn run_for_tree(&self, tree_id: i64) -> Result<Option<PhyloRun>, StoreError> {
        let Some(tree) = self.trees.iter().find(|tree| tree.id == tree_id) else {
            return Ok(None);
        };
        Ok(self.runs.iter().find(|run| run.id == tree.run_id).cloned())
    }

    async fn samples_for_group(&self, group_id: i64) -> Result<Vec<Sample>, StoreError> {
        Ok(self
            .samples
            .iter()
            .filter(|sample| sample.submitting_group_id == group_id)
            .cloned()
            .collect())
    }

    async fn can_see_group_ids(
        &self,
        viewer_group_id: i64,
        data_type: DataType,
    ) -> Result<BTreeSet<i64>, StoreError> {
        Ok(self
            .can_see
            .iter()
            .filter(|grant| {
                grant.viewer_group_id == viewer_group_id && grant.data_type == data_type
            })
            .map(|grant| grant.owner_group_id)
            .collect())
    }

    async fn nearest_countries(
        &self,
        origin_country: &str,
        candidates: &BTreeSet<String>,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        let origin = self
            .locations
            .iter()
            .find(|location| location.is_country_level() && location.country == origin_country);
        let Some(origin) = origin else {
            warn!("No country-level location for {origin_country:?}, geographic ranking is empty.");
            return Ok(Vec::new());
        };

        let mut ranked: Vec<(f64, &str)> = self
            .locations
            .iter()
            .filter(|location| {
                location.is_country_level() && candidates.contains(&location.country)
            })
            .map(|location| (haversine_km(origin, location), location.country.as_str()))
            .collect();
        // ties broken by name so the ranking is deterministic
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));

        let mut seen = BTreeSet::new();
        Ok(ranked
            .into_iter()
            .filter(|(_, country)| seen.insert(*country))
            .map(|(_, country)| country.to_string())
            .take(limit)
            .collect())
    }
}

// ----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::{Report, Result};

    fn country(name: &str, latitude: f64, longitude: f64) -> Location {
        Location { country: name.to_string(), division: None, location: None, latitude, longitude }
    }

    #[test]
    fn haversine_is_zero_at_identity() {
        let usa = country("USA", 37.09024, -95.712891);
        assert!(haversine_km(&usa, &usa).abs() < 1e-9);
    }

    #[tokio::test]
    async fn nearest_countries_orders_by_distance() -> Result<(), Report> {
        let db = MemoryDatabase {
            locations: vec![
                country("USA", 37.09024, -95.712891),
                country("Mexico", 23.634501, -102.552784),
                country("France", 46.227638, 2.213749),
                country("Japan", 36.204824, 138.252924),
            ],
            ..Default::default()
        };
        let candidates = BTreeSet::from([
            "France".to_string(),
            "Japan".to_string(),
            "Mexico".to_string(),
        ]);

        let observed = db.nearest_countries("USA", &candidates, 15).await?;
        let expected = vec!["Mexico".to_string(), "France".to_string(), "Japan".to_string()];
        assert_eq!(observed, expected);

        let observed = db.nearest_countries("USA", &candidates, 1).await?;
        assert_eq!(observed, vec!["Mexico".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn nearest_countries_ignores_division_rows() -> Result<(), Report> {
        let mut california = country("USA", 36.778261, -119.417932);
        california.division = Some("California".to_string());
        let db = MemoryDatabase {
            locations: vec![california, country("Mexico", 23.634501, -102.552784)],
            ..Default::default()
        };
        let candidates = BTreeSet::from(["Mexico".to_string()]);

        // no country-level USA row, so the ranking is empty rather than an error
        let observed = db.nearest_countries("USA", &candidates, 15).await?;
        assert!(observed.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn missing_object_is_an_error() {
        let store = MemoryStore::new();
        let observed = store.get("trees", "missing.json").await;
        assert!(matches!(observed, Err(StoreError::ObjectMissing { .. })));
    }
}
