//! Query-string state store. Every piece of shareable UI state lives in the
//! URL: reading a param decodes it, mutating state re-encodes the whole query
//! and replaces the current history entry, so any view is reconstructible
//! from its address alone.

use std::collections::HashSet;

use leptos::prelude::*;

use crate::map::BasemapId;

const PARAM_MAP_STATUS: &str = "mapStatus";
const PARAM_MAP_SHAPE: &str = "mapShape";
const PARAM_DATASETS: &str = "datasets";
const PARAM_CATEGORY: &str = "category";
const PARAM_LAYERS: &str = "layers";
const PARAM_BASEMAP: &str = "basemap";

/// Interaction phase of the map view. Drives which panels, bars, and dialogs
/// are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapStatus {
    #[default]
    Default,
    Upload,
    Analysis,
}

impl MapStatus {
    pub fn as_query(self) -> &'static str {
        match self {
            MapStatus::Default => "default",
            MapStatus::Upload => "upload",
            MapStatus::Analysis => "analysis",
        }
    }

    pub fn from_query(raw: &str) -> Option<Self> {
        match raw {
            "default" => Some(MapStatus::Default),
            "upload" => Some(MapStatus::Upload),
            "analysis" => Some(MapStatus::Analysis),
            _ => None,
        }
    }
}

/// Ordered, duplicate-free set of active layer ids. Order is first-activation
/// order and is what the `layers` param serializes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerSelection {
    order: Vec<String>,
    members: HashSet<String>,
}

impl LayerSelection {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::default();
        for id in ids {
            selection.insert(id.into());
        }
        selection
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn insert(&mut self, id: String) {
        if self.members.insert(id.clone()) {
            self.order.push(id);
        }
    }

    pub fn remove(&mut self, id: &str) {
        if self.members.remove(id) {
            self.order.retain(|existing| existing != id);
        }
    }

    /// Idempotent: setting an already-matching membership is a no-op.
    pub fn set_active(&mut self, id: &str, active: bool) {
        if active {
            self.insert(id.to_string());
        } else {
            self.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }
}

/// Full decoded query-string state with its defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlState {
    pub map_status: MapStatus,
    pub map_shape: bool,
    pub datasets: bool,
    pub category: Option<i64>,
    pub layers: LayerSelection,
    pub basemap: BasemapId,
}

impl UrlState {
    /// Decode a query string (with or without the leading `?`). Unknown params
    /// and unparseable values fall back to the defaults.
    pub fn decode(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut state = Self::default();

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, raw_value) = match pair.split_once('=') {
                Some((k, v)) => (k, v),
                None => (pair, ""),
            };
            match key {
                PARAM_MAP_STATUS => {
                    if let Some(status) = MapStatus::from_query(&decode_component(raw_value)) {
                        state.map_status = status;
                    }
                }
                PARAM_MAP_SHAPE => state.map_shape = decode_component(raw_value) == "true",
                PARAM_DATASETS => state.datasets = decode_component(raw_value) == "true",
                PARAM_CATEGORY => {
                    // 0 means "all categories" and is never a real filter
                    state.category = decode_component(raw_value)
                        .parse::<i64>()
                        .ok()
                        .filter(|id| *id != 0);
                }
                PARAM_LAYERS => {
                    // Ids are encoded individually so a comma inside an id survives
                    state.layers = LayerSelection::from_ids(
                        raw_value
                            .split(',')
                            .filter(|id| !id.is_empty())
                            .map(decode_component),
                    );
                }
                PARAM_BASEMAP => {
                    if let Some(basemap) = BasemapId::from_query(&decode_component(raw_value)) {
                        state.basemap = basemap;
                    }
                }
                _ => {}
            }
        }

        state
    }

    /// Encode to a canonical query string. Params at their default value are
    /// omitted; a fully-default state encodes to the empty string.
    pub fn encode(&self) -> String {
        let mut pairs: Vec<(&'static str, String)> = Vec::new();

        if self.map_status != MapStatus::default() {
            pairs.push((PARAM_MAP_STATUS, self.map_status.as_query().to_string()));
        }
        if self.map_shape {
            pairs.push((PARAM_MAP_SHAPE, "true".to_string()));
        }
        if self.datasets {
            pairs.push((PARAM_DATASETS, "true".to_string()));
        }
        if let Some(id) = self.category {
            pairs.push((PARAM_CATEGORY, id.to_string()));
        }
        if !self.layers.is_empty() {
            let joined = self
                .layers
                .ids()
                .iter()
                .map(|id| encode_component(id))
                .collect::<Vec<_>>()
                .join(",");
            pairs.push((PARAM_LAYERS, joined));
        }
        if self.basemap != BasemapId::default() {
            pairs.push((PARAM_BASEMAP, self.basemap.as_query().to_string()));
        }

        if pairs.is_empty() {
            return String::new();
        }

        let mut out = String::from("?");
        for (i, (key, value)) in pairs.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(key);
            out.push('=');
            out.push_str(value);
        }
        out
    }
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
}

fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for &byte in raw.as_bytes() {
        if is_unreserved(byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn decode_component(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(decoded) = raw
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
        {
            out.push(decoded);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| raw.to_string())
}

/// Reactive store over [`UrlState`]. Each setter mutates its slice and issues
/// exactly one `history.replaceState` with the re-encoded query; multi-slice
/// transitions batch their writes into a single history update too.
#[derive(Clone, Copy)]
pub struct UrlStore {
    map_status: RwSignal<MapStatus>,
    map_shape: RwSignal<bool>,
    datasets: RwSignal<bool>,
    category: RwSignal<Option<i64>>,
    layers: RwSignal<LayerSelection>,
    basemap: RwSignal<BasemapId>,
}

impl UrlStore {
    pub fn new(initial: UrlState) -> Self {
        Self {
            map_status: RwSignal::new(initial.map_status),
            map_shape: RwSignal::new(initial.map_shape),
            datasets: RwSignal::new(initial.datasets),
            category: RwSignal::new(initial.category),
            layers: RwSignal::new(initial.layers),
            basemap: RwSignal::new(initial.basemap),
        }
    }

    pub fn from_location() -> Self {
        let query = web_sys::window()
            .and_then(|window| window.location().search().ok())
            .unwrap_or_default();
        Self::new(UrlState::decode(&query))
    }

    // Tracked reads, for use inside reactive closures.
    pub fn map_status(&self) -> MapStatus {
        self.map_status.get()
    }

    pub fn map_shape(&self) -> bool {
        self.map_shape.get()
    }

    pub fn datasets(&self) -> bool {
        self.datasets.get()
    }

    pub fn category(&self) -> Option<i64> {
        self.category.get()
    }

    pub fn layers(&self) -> LayerSelection {
        self.layers.get()
    }

    pub fn basemap(&self) -> BasemapId {
        self.basemap.get()
    }

    pub fn map_status_untracked(&self) -> MapStatus {
        self.map_status.get_untracked()
    }

    pub fn map_shape_untracked(&self) -> bool {
        self.map_shape.get_untracked()
    }

    pub fn datasets_untracked(&self) -> bool {
        self.datasets.get_untracked()
    }

    pub fn set_map_status(&self, status: MapStatus) {
        self.map_status.set(status);
        self.sync_to_history();
    }

    pub fn set_map_shape(&self, shape: bool) {
        self.map_shape.set(shape);
        self.sync_to_history();
    }

    pub fn set_datasets(&self, open: bool) {
        self.datasets.set(open);
        self.sync_to_history();
    }

    pub fn set_category(&self, category: Option<i64>) {
        self.category.set(category);
        self.sync_to_history();
    }

    pub fn set_layer_active(&self, id: &str, active: bool) {
        self.layers.update(|layers| layers.set_active(id, active));
        self.sync_to_history();
    }

    pub fn clear_layers(&self) {
        self.layers.set(LayerSelection::default());
        self.sync_to_history();
    }

    pub fn set_basemap(&self, basemap: BasemapId) {
        self.basemap.set(basemap);
        self.sync_to_history();
    }

    /// Cancel the upload flow: back to the default view, dropping any staged
    /// shape. One history write.
    pub fn cancel_upload(&self) {
        self.map_status.set(MapStatus::Default);
        self.map_shape.set(false);
        self.sync_to_history();
    }

    /// Upload confirmed: enter analysis keeping the drawn shape. One history write.
    pub fn confirm_analysis(&self) {
        self.map_status.set(MapStatus::Analysis);
        self.sync_to_history();
    }

    /// "Clear & go back": drop the analysis and every param with it.
    pub fn clear_analysis(&self) {
        self.apply(UrlState::default());
        self.sync_to_history();
    }

    pub fn snapshot(&self) -> UrlState {
        UrlState {
            map_status: self.map_status.get_untracked(),
            map_shape: self.map_shape.get_untracked(),
            datasets: self.datasets.get_untracked(),
            category: self.category.get_untracked(),
            layers: self.layers.get_untracked(),
            basemap: self.basemap.get_untracked(),
        }
    }

    /// Overwrite all slices from a decoded state without touching history.
    /// Used on popstate, where the browser already owns the URL.
    pub fn apply(&self, state: UrlState) {
        if self.map_status.get_untracked() != state.map_status {
            self.map_status.set(state.map_status);
        }
        if self.map_shape.get_untracked() != state.map_shape {
            self.map_shape.set(state.map_shape);
        }
        if self.datasets.get_untracked() != state.datasets {
            self.datasets.set(state.datasets);
        }
        if self.category.get_untracked() != state.category {
            self.category.set(state.category);
        }
        if self.layers.get_untracked() != state.layers {
            self.layers.set(state.layers);
        }
        if self.basemap.get_untracked() != state.basemap {
            self.basemap.set(state.basemap);
        }
    }

    fn sync_to_history(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let location = window.location();
        let Ok(pathname) = location.pathname() else {
            return;
        };
        let url = format!("{pathname}{}", self.snapshot().encode());
        if let Ok(history) = window.history() {
            let _ = history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&url));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_encodes_to_empty_query() {
        assert_eq!(UrlState::default().encode(), "");
    }

    #[test]
    fn empty_query_decodes_to_defaults() {
        assert_eq!(UrlState::decode(""), UrlState::default());
        assert_eq!(UrlState::decode("?"), UrlState::default());
    }

    #[test]
    fn non_default_params_encode_in_canonical_order() {
        let state = UrlState {
            map_status: MapStatus::Analysis,
            map_shape: true,
            datasets: true,
            category: Some(3),
            layers: LayerSelection::from_ids(["7", "2"]),
            basemap: BasemapId::Satellite,
        };
        assert_eq!(
            state.encode(),
            "?mapStatus=analysis&mapShape=true&datasets=true&category=3&layers=7,2&basemap=satellite"
        );
    }

    #[test]
    fn decode_round_trips_encode() {
        let state = UrlState {
            map_status: MapStatus::Upload,
            map_shape: true,
            datasets: false,
            category: Some(12),
            layers: LayerSelection::from_ids(["5"]),
            basemap: BasemapId::default(),
        };
        assert_eq!(UrlState::decode(&state.encode()), state);
    }

    #[test]
    fn unknown_and_malformed_values_fall_back_to_defaults() {
        let state = UrlState::decode("?mapStatus=bogus&category=abc&basemap=mars&foo=bar");
        assert_eq!(state, UrlState::default());
    }

    #[test]
    fn category_zero_reads_as_no_filter() {
        let state = UrlState::decode("?category=0");
        assert_eq!(state.category, None);
    }

    #[test]
    fn layer_order_is_first_activation_order() {
        let mut layers = LayerSelection::default();
        layers.set_active("9", true);
        layers.set_active("1", true);
        layers.set_active("9", true); // repeat keeps original position
        assert_eq!(layers.ids(), ["9", "1"]);
        layers.set_active("9", false);
        assert_eq!(layers.ids(), ["1"]);
        layers.set_active("1", false);
        layers.set_active("1", false); // removing twice is a no-op
        assert!(layers.is_empty());
    }

    #[test]
    fn layer_ids_with_reserved_characters_round_trip() {
        let layers = LayerSelection::from_ids(["a,b", "c d"]);
        let state = UrlState {
            layers,
            ..UrlState::default()
        };
        let encoded = state.encode();
        assert_eq!(encoded, "?layers=a%2Cb,c%20d");
        assert_eq!(UrlState::decode(&encoded), state);
    }

    #[test]
    fn upload_then_confirm_produces_analysis_query() {
        let mut state = UrlState::default();
        state.map_status = MapStatus::Upload;
        assert_eq!(state.encode(), "?mapStatus=upload");
        state.map_shape = true;
        state.map_status = MapStatus::Analysis;
        assert_eq!(state.encode(), "?mapStatus=analysis&mapShape=true");
    }

    #[test]
    fn percent_decoding_handles_truncated_escapes() {
        assert_eq!(decode_component("a%2"), "a%2");
        assert_eq!(decode_component("%"), "%");
        assert_eq!(decode_component("%2Cx"), ",x");
    }
}
