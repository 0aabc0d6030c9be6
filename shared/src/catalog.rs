use serde::{Deserialize, Serialize};

use crate::i18n::Translatable;

/// Paginated list envelope used by every catalog listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Vec<T>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMetadata {
    pub title: Translatable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub metadata: CategoryMetadata,
    /// Nested datasets, present only when requested with `include_datasets`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasets: Option<Vec<Dataset>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub title: Translatable,
    pub description: Translatable,
    #[serde(default, skip_serializing_if = "Translatable::is_empty")]
    pub source: Translatable,
    #[serde(default, skip_serializing_if = "Translatable::is_empty")]
    pub citation: Translatable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: i64,
    pub metadata: DatasetMetadata,
    pub category_id: i64,
    /// Nested layers, present only when requested with `include_layers`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<Layer>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerMetadata {
    pub title: Translatable,
    pub description: Translatable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: i64,
    pub format: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    pub unit: String,
    pub metadata: LayerMetadata,
    pub dataset_id: i64,
}

pub type CategoryResponse = ApiResponse<Category>;
pub type DatasetResponse = ApiResponse<Dataset>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Translatable;

    #[test]
    fn dataset_without_layers_omits_the_field() {
        let dataset = Dataset {
            id: 3,
            metadata: DatasetMetadata {
                title: Translatable::new([("en", "Permafrost extent")]),
                description: Translatable::new([("en", "Modelled permafrost zones")]),
                source: Translatable::default(),
                citation: Translatable::default(),
            },
            category_id: 1,
            layers: None,
        };
        let json = serde_json::to_value(&dataset).unwrap();
        assert!(json.get("layers").is_none());
        assert!(json.get("source").is_none());
    }

    #[test]
    fn layer_kind_round_trips_as_type() {
        let json = serde_json::json!({
            "id": 7,
            "format": "cog",
            "type": "raster",
            "path": "rasters/treeline.tif",
            "unit": "%",
            "metadata": {
                "title": {"en": "Treeline"},
                "description": {"en": "Northern treeline position"}
            },
            "dataset_id": 3
        });
        let layer: Layer = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(layer.kind, "raster");
        assert_eq!(serde_json::to_value(&layer).unwrap(), json);
    }

    #[test]
    fn response_envelope_carries_total_independent_of_page_size() {
        let response = ApiResponse::<Category> {
            data: vec![],
            total: 42,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["total"], 42);
        assert_eq!(json["data"].as_array().unwrap().len(), 0);
    }
}
