use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;

use boreal_shared::etag::payload_etag;
use boreal_shared::{ApiResponse, Category, Dataset, Layer};

/// Fallback seed compiled into the binary so a fresh checkout serves data
/// without any provisioning.
const EMBEDDED_SEED: &str = include_str!("../data/catalog.json");

#[derive(Debug)]
pub enum CatalogError {
    Parse(serde_json::Error),
    MissingFallbackTitle { entity: &'static str, id: i64 },
    DanglingReference { entity: &'static str, id: i64 },
    DuplicateId { entity: &'static str, id: i64 },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Parse(e) => write!(f, "invalid catalog JSON: {e}"),
            CatalogError::MissingFallbackTitle { entity, id } => {
                write!(f, "{entity} {id} has no English title")
            }
            CatalogError::DanglingReference { entity, id } => {
                write!(f, "{entity} {id} references a missing parent")
            }
            CatalogError::DuplicateId { entity, id } => {
                write!(f, "duplicate {entity} id {id}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

#[derive(Debug, Deserialize)]
struct SeedFile {
    categories: Vec<Category>,
    datasets: Vec<Dataset>,
    layers: Vec<Layer>,
}

/// Query parameters shared by the listing endpoints.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub offset: usize,
    pub limit: Option<usize>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn is_default(&self) -> bool {
        self.offset == 0 && self.limit.is_none() && self.search.is_none()
    }
}

/// In-memory catalog seeded once at startup. Read-only afterwards, so the
/// hot-path payloads (full category and dataset listings) are serialized a
/// single time and shared by every response.
pub struct CatalogStore {
    categories: Vec<Category>,
    datasets: Vec<Dataset>,
    layers: Vec<Layer>,
    categories_json: Arc<Bytes>,
    categories_etag: String,
    datasets_json: Arc<Bytes>,
    datasets_etag: String,
}

impl CatalogStore {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let seed: SeedFile = serde_json::from_str(json).map_err(CatalogError::Parse)?;
        Self::from_seed(seed)
    }

    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json(EMBEDDED_SEED)
    }

    fn from_seed(seed: SeedFile) -> Result<Self, CatalogError> {
        validate(&seed)?;

        let SeedFile {
            categories,
            mut datasets,
            layers,
        } = seed;
        // Stored datasets never carry nested children; nesting is applied per
        // request so `include_layers=false` stays cheap.
        for dataset in &mut datasets {
            dataset.layers = None;
        }

        let categories_response = ApiResponse {
            total: categories.len(),
            data: categories.clone(),
        };
        let categories_json = serde_json::to_vec(&categories_response)
            .map(Bytes::from)
            .map_err(CatalogError::Parse)?;

        let datasets_response = ApiResponse {
            total: datasets.len(),
            data: datasets
                .iter()
                .map(|dataset| with_layers(dataset, &layers))
                .collect::<Vec<_>>(),
        };
        let datasets_json = serde_json::to_vec(&datasets_response)
            .map(Bytes::from)
            .map_err(CatalogError::Parse)?;

        let categories_etag = payload_etag(&categories_json);
        let datasets_etag = payload_etag(&datasets_json);

        Ok(Self {
            categories,
            datasets,
            layers,
            categories_json: Arc::new(categories_json),
            categories_etag,
            datasets_json: Arc::new(datasets_json),
            datasets_etag,
        })
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn dataset_count(&self) -> usize {
        self.datasets.len()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Pre-serialized full category listing with its ETag.
    pub fn categories_payload(&self) -> (Arc<Bytes>, &str) {
        (Arc::clone(&self.categories_json), &self.categories_etag)
    }

    /// Pre-serialized full dataset listing (layers included) with its ETag.
    pub fn datasets_payload(&self) -> (Arc<Bytes>, &str) {
        (Arc::clone(&self.datasets_json), &self.datasets_etag)
    }

    pub fn list_categories(&self, query: &ListQuery) -> ApiResponse<Category> {
        let matching: Vec<&Category> = self
            .categories
            .iter()
            .filter(|category| match &query.search {
                Some(needle) => category.metadata.title.matches(needle),
                None => true,
            })
            .collect();
        let total = matching.len();
        let data = page(&matching, query).into_iter().cloned().collect();
        ApiResponse { data, total }
    }

    pub fn category(
        &self,
        id: i64,
        include_datasets: bool,
        include_layers: bool,
    ) -> Option<Category> {
        let mut category = self.categories.iter().find(|c| c.id == id)?.clone();
        if include_datasets {
            let datasets = self
                .datasets
                .iter()
                .filter(|dataset| dataset.category_id == id)
                .map(|dataset| {
                    if include_layers {
                        with_layers(dataset, &self.layers)
                    } else {
                        dataset.clone()
                    }
                })
                .collect();
            category.datasets = Some(datasets);
        }
        Some(category)
    }

    pub fn list_datasets(&self, query: &ListQuery, include_layers: bool) -> ApiResponse<Dataset> {
        let matching: Vec<&Dataset> = self
            .datasets
            .iter()
            .filter(|dataset| match &query.search {
                Some(needle) => {
                    dataset.metadata.title.matches(needle)
                        || dataset.metadata.description.matches(needle)
                }
                None => true,
            })
            .collect();
        let total = matching.len();
        let data = page(&matching, query)
            .into_iter()
            .map(|dataset| {
                if include_layers {
                    with_layers(dataset, &self.layers)
                } else {
                    (*dataset).clone()
                }
            })
            .collect();
        ApiResponse { data, total }
    }

    pub fn dataset(&self, id: i64, include_layers: bool) -> Option<Dataset> {
        let dataset = self.datasets.iter().find(|d| d.id == id)?;
        Some(if include_layers {
            with_layers(dataset, &self.layers)
        } else {
            dataset.clone()
        })
    }

    pub fn list_layers(&self, query: &ListQuery) -> ApiResponse<Layer> {
        let matching: Vec<&Layer> = self
            .layers
            .iter()
            .filter(|layer| match &query.search {
                Some(needle) => {
                    layer.metadata.title.matches(needle)
                        || layer.metadata.description.matches(needle)
                }
                None => true,
            })
            .collect();
        let total = matching.len();
        let data = page(&matching, query).into_iter().cloned().collect();
        ApiResponse { data, total }
    }

    pub fn layer(&self, id: i64) -> Option<Layer> {
        self.layers.iter().find(|l| l.id == id).cloned()
    }
}

fn with_layers(dataset: &Dataset, layers: &[Layer]) -> Dataset {
    let mut dataset = dataset.clone();
    dataset.layers = Some(
        layers
            .iter()
            .filter(|layer| layer.dataset_id == dataset.id)
            .cloned()
            .collect(),
    );
    dataset
}

fn page<'a, T>(items: &'a [&'a T], query: &ListQuery) -> Vec<&'a T> {
    let start = query.offset.min(items.len());
    let end = match query.limit {
        Some(limit) => (start + limit.clamp(1, crate::config::MAX_PAGE_LIMIT)).min(items.len()),
        None => items.len(),
    };
    items[start..end].to_vec()
}

fn validate(seed: &SeedFile) -> Result<(), CatalogError> {
    let mut category_ids = std::collections::HashSet::new();
    for category in &seed.categories {
        if !category_ids.insert(category.id) {
            return Err(CatalogError::DuplicateId {
                entity: "category",
                id: category.id,
            });
        }
        if category.metadata.title.resolve("en").is_none() {
            return Err(CatalogError::MissingFallbackTitle {
                entity: "category",
                id: category.id,
            });
        }
    }

    let mut dataset_ids = std::collections::HashSet::new();
    for dataset in &seed.datasets {
        if !dataset_ids.insert(dataset.id) {
            return Err(CatalogError::DuplicateId {
                entity: "dataset",
                id: dataset.id,
            });
        }
        if dataset.metadata.title.resolve("en").is_none() {
            return Err(CatalogError::MissingFallbackTitle {
                entity: "dataset",
                id: dataset.id,
            });
        }
        if !category_ids.contains(&dataset.category_id) {
            return Err(CatalogError::DanglingReference {
                entity: "dataset",
                id: dataset.id,
            });
        }
    }

    let mut layer_ids = std::collections::HashSet::new();
    for layer in &seed.layers {
        if !layer_ids.insert(layer.id) {
            return Err(CatalogError::DuplicateId {
                entity: "layer",
                id: layer.id,
            });
        }
        if layer.metadata.title.resolve("en").is_none() {
            return Err(CatalogError::MissingFallbackTitle {
                entity: "layer",
                id: layer.id,
            });
        }
        if !dataset_ids.contains(&layer.dataset_id) {
            return Err(CatalogError::DanglingReference {
                entity: "layer",
                id: layer.id,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CatalogStore {
        CatalogStore::embedded().expect("embedded seed must be valid")
    }

    #[test]
    fn embedded_seed_loads_and_preserializes() {
        let store = store();
        assert!(store.category_count() > 0);
        assert!(store.dataset_count() > 0);
        assert!(store.layer_count() > 0);

        let (json, etag) = store.categories_payload();
        let parsed: ApiResponse<Category> = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed.total, store.category_count());
        assert_eq!(etag, payload_etag(&json));
    }

    #[test]
    fn dataset_listing_nests_layers_on_request() {
        let store = store();
        let with = store.list_datasets(&ListQuery::default(), true);
        assert!(with.data.iter().all(|d| d.layers.is_some()));

        let without = store.list_datasets(&ListQuery::default(), false);
        assert!(without.data.iter().all(|d| d.layers.is_none()));
    }

    #[test]
    fn search_filters_but_total_reflects_matches() {
        let store = store();
        let all = store.list_categories(&ListQuery::default());
        let filtered = store.list_categories(&ListQuery {
            search: Some("environment".into()),
            ..ListQuery::default()
        });
        assert!(filtered.total < all.total);
        assert!(filtered.total >= 1);
    }

    #[test]
    fn pagination_bounds_are_clamped() {
        let store = store();
        let response = store.list_categories(&ListQuery {
            offset: 10_000,
            limit: Some(5),
            search: None,
        });
        assert_eq!(response.data.len(), 0);
        assert_eq!(response.total, store.category_count());
    }

    #[test]
    fn absent_limit_returns_the_full_listing() {
        let store = store();
        let response = store.list_layers(&ListQuery::default());
        assert_eq!(response.data.len(), store.layer_count());
        assert_eq!(response.total, store.layer_count());
    }

    #[test]
    fn search_matches_descriptions_in_any_locale() {
        let store = store();
        // "treaty" only appears in a dataset description, not in any title
        let datasets = store.list_datasets(
            &ListQuery {
                search: Some("treaty".into()),
                ..ListQuery::default()
            },
            false,
        );
        assert!(datasets.total >= 1);

        let layers = store.list_layers(&ListQuery {
            search: Some("airstrips".into()),
            ..ListQuery::default()
        });
        assert_eq!(layers.total, 1);
    }

    #[test]
    fn layer_listing_paginates_like_the_other_listings() {
        let store = store();
        let response = store.list_layers(&ListQuery {
            offset: 1,
            limit: Some(3),
            search: None,
        });
        assert_eq!(response.data.len(), 3);
        assert_eq!(response.total, store.layer_count());
    }

    #[test]
    fn unknown_ids_resolve_to_none() {
        let store = store();
        assert!(store.category(999_999, false, false).is_none());
        assert!(store.dataset(999_999, false).is_none());
        assert!(store.layer(999_999).is_none());
    }

    #[test]
    fn category_item_nests_datasets_and_layers() {
        let store = store();
        let first = store.list_categories(&ListQuery::default()).data[0].id;
        let category = store.category(first, true, true).unwrap();
        let datasets = category.datasets.unwrap();
        assert!(!datasets.is_empty());
        assert!(datasets.iter().all(|d| d.layers.is_some()));
    }

    #[test]
    fn dangling_layer_reference_is_rejected() {
        let json = r#"{
            "categories": [{"id": 1, "metadata": {"title": {"en": "A"}}}],
            "datasets": [],
            "layers": [{
                "id": 1, "format": "cog", "type": "raster", "path": "p", "unit": "",
                "metadata": {"title": {"en": "L"}, "description": {"en": "d"}},
                "dataset_id": 42
            }]
        }"#;
        assert!(matches!(
            CatalogStore::from_json(json),
            Err(CatalogError::DanglingReference { .. })
        ));
    }

    #[test]
    fn missing_english_title_is_rejected() {
        let json = r#"{
            "categories": [{"id": 1, "metadata": {"title": {"fr": "Seulement"}}}],
            "datasets": [],
            "layers": []
        }"#;
        assert!(matches!(
            CatalogStore::from_json(json),
            Err(CatalogError::MissingFallbackTitle { .. })
        ));
    }
}
