#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

//! Sidebar panels: data-layer browsing in the default view, the analysis
//! panel with its leave-confirmation dialog, and the secondary datasets panel
//! used during analysis. Width changes animate; the map resizes itself when
//! the transition finishes, not before.

use leptos::prelude::*;

use boreal_shared::Dataset;

use crate::app::{DATASETS_PANEL_WIDTH, Locale, ResizeNonce, SIDEBAR_WIDTH};
use crate::i18n::{t, translate_field};
use crate::queries::{
    CATEGORIES_URL, CategoriesQuery, DATASETS_URL, DatasetsQuery, QueryStatus, ensure_fetch,
    invalidate,
};
use crate::url_state::{MapStatus, UrlStore};

#[derive(Clone, PartialEq)]
pub(crate) struct CategoryOption {
    pub id: i64,
    pub label: String,
}

#[derive(Clone, PartialEq)]
pub(crate) struct LayerView {
    pub id: i64,
    /// Value serialized into the `layers` query param.
    pub param: String,
    pub title: String,
}

#[derive(Clone, PartialEq)]
pub(crate) struct DatasetView {
    pub id: i64,
    pub category_id: i64,
    pub title: String,
    pub description: String,
    pub source: String,
    pub layers: Vec<LayerView>,
}

pub(crate) fn dataset_view(locale: &str, dataset: &Dataset) -> DatasetView {
    DatasetView {
        id: dataset.id,
        category_id: dataset.category_id,
        title: translate_field(locale, &dataset.metadata.title),
        description: translate_field(locale, &dataset.metadata.description),
        source: translate_field(locale, &dataset.metadata.source),
        layers: dataset
            .layers
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|layer| LayerView {
                id: layer.id,
                param: layer.id.to_string(),
                title: translate_field(locale, &layer.metadata.title),
            })
            .collect(),
    }
}

/// Category and text filter over the localized dataset list. The text filter
/// matches what the user can see: dataset titles, descriptions, layer titles.
pub(crate) fn filter_datasets(
    datasets: &[DatasetView],
    category: Option<i64>,
    search: &str,
) -> Vec<DatasetView> {
    let needle = search.trim().to_lowercase();
    datasets
        .iter()
        .filter(|dataset| category.is_none_or(|id| dataset.category_id == id))
        .filter(|dataset| {
            needle.is_empty()
                || dataset.title.to_lowercase().contains(&needle)
                || dataset.description.to_lowercase().contains(&needle)
                || dataset
                    .layers
                    .iter()
                    .any(|layer| layer.title.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

fn localized_datasets(locale: &'static str) -> Memo<Vec<DatasetView>> {
    let DatasetsQuery(query) = expect_context();
    Memo::new(move |_| match query.status.get() {
        QueryStatus::Success(resp) => resp
            .data
            .iter()
            .map(|dataset| dataset_view(locale, dataset))
            .collect(),
        _ => Vec::new(),
    })
}

/// Primary sidebar. Collapses to zero width during the upload flow so the map
/// gets the whole viewport while a shape is being staged.
#[component]
pub fn MapSidebar() -> impl IntoView {
    let store: UrlStore = expect_context();
    let ResizeNonce(resize_nonce) = expect_context();

    let width = move || {
        if store.map_status() == MapStatus::Upload {
            "0px".to_string()
        } else {
            format!("{SIDEBAR_WIDTH}px")
        }
    };

    view! {
        <aside
            style="height: 100%; overflow: hidden; transition: width 0.3s ease; background: #fff; border-right: 1px solid #e2e8f0; flex-shrink: 0;"
            style:width=width
            on:transitionend=move |e: web_sys::TransitionEvent| {
                if e.property_name() == "width" {
                    resize_nonce.update(|n| *n = n.wrapping_add(1));
                }
            }
        >
            <div style=format!(
                "width: {SIDEBAR_WIDTH}px; min-width: {SIDEBAR_WIDTH}px; height: 100%; display: flex; flex-direction: column;",
            )>
                {move || {
                    if store.map_status() == MapStatus::Analysis {
                        view! { <AnalysisPanel /> }.into_any()
                    } else {
                        view! { <MainPanel /> }.into_any()
                    }
                }}
            </div>
        </aside>
    }
}

#[component]
fn MainPanel() -> impl IntoView {
    let store: UrlStore = expect_context();
    let Locale(locale) = expect_context();
    let CategoriesQuery(categories_query) = expect_context();
    let DatasetsQuery(datasets_query) = expect_context();

    let retry = move |_| {
        invalidate(categories_query);
        invalidate(datasets_query);
        ensure_fetch(categories_query, CATEGORIES_URL);
        ensure_fetch(datasets_query, DATASETS_URL);
    };

    let search = RwSignal::new(String::new());
    let datasets = localized_datasets(locale);
    let filtered =
        Memo::new(move |_| filter_datasets(&datasets.get(), store.category(), &search.get()));

    view! {
        <div style="padding: 16px; border-bottom: 1px solid #e2e8f0;">
            <h2 style="margin: 0 0 4px; font-size: 1.05rem;">{t(locale, "map.title")}</h2>
            <p style="margin: 0; font-size: 0.8rem; color: #64748b;">
                {t(locale, "map.description")}
            </p>
        </div>
        <div style="padding: 12px 16px; display: flex; flex-direction: column; gap: 10px;">
            <input
                type="search"
                placeholder=t(locale, "data-layers.search")
                style="width: 100%; box-sizing: border-box; padding: 8px 10px; border: 1px solid #cbd5e1; border-radius: 6px; font-size: 0.85rem;"
                on:input=move |e| search.set(event_target_value(&e))
                prop:value=move || search.get()
            />
            <CategorySelector />
        </div>
        <div style="flex: 1; overflow-y: auto; padding: 0 16px 16px;">
            {move || match datasets_query.status.get() {
                QueryStatus::Idle | QueryStatus::Loading => {
                    view! {
                        <p style="font-size: 0.85rem; color: #64748b;">
                            {t(locale, "data-layers.loading")}
                        </p>
                    }
                        .into_any()
                }
                QueryStatus::Error(_) => {
                    view! {
                        <p style="font-size: 0.85rem; color: #b91c1c;">
                            {t(locale, "data-layers.error")}
                        </p>
                        <button
                            style="align-self: flex-start; padding: 6px 14px; border: 1px solid #cbd5e1; border-radius: 6px; background: #fff; font-size: 0.82rem; cursor: pointer;"
                            on:click=retry
                        >
                            {t(locale, "data-layers.retry")}
                        </button>
                    }
                        .into_any()
                }
                QueryStatus::Success(_) => view! { <DataLayersList datasets=filtered /> }.into_any(),
            }}
        </div>
        <BottomBar />
    }
}

#[component]
fn CategorySelector() -> impl IntoView {
    let store: UrlStore = expect_context();
    let Locale(locale) = expect_context();
    let CategoriesQuery(query) = expect_context();

    let categories = Memo::new(move |_| match query.status.get() {
        QueryStatus::Success(resp) => resp
            .data
            .iter()
            .map(|category| CategoryOption {
                id: category.id,
                label: translate_field(locale, &category.metadata.title),
            })
            .collect::<Vec<_>>(),
        _ => Vec::new(),
    });

    let pill = |active: bool| {
        format!(
            "padding: 5px 12px; border-radius: 9999px; border: 1px solid {}; background: {}; color: {}; font-size: 0.78rem; cursor: pointer;",
            if active { "#1d4ed8" } else { "#cbd5e1" },
            if active { "#1d4ed8" } else { "#fff" },
            if active { "#fff" } else { "#334155" },
        )
    };

    view! {
        <div style="display: flex; flex-wrap: wrap; gap: 6px;">
            <button
                style=move || pill(store.category().is_none())
                on:click=move |_| store.set_category(None)
            >
                {t(locale, "data-layers.category.all")}
            </button>
            {move || {
                categories
                    .get()
                    .into_iter()
                    .map(|option| {
                        let id = option.id;
                        view! {
                            <button
                                style=move || pill(store.category() == Some(id))
                                on:click=move |_| store.set_category(Some(id))
                            >
                                {option.label}
                            </button>
                        }
                    })
                    .collect_view()
            }}
        </div>
    }
}

#[component]
pub(crate) fn DataLayersList(datasets: Memo<Vec<DatasetView>>) -> impl IntoView {
    view! {
        <div style="display: flex; flex-direction: column; gap: 8px;">
            {move || {
                datasets
                    .get()
                    .into_iter()
                    .map(|dataset| view! { <DatasetItem dataset=dataset /> })
                    .collect_view()
            }}
        </div>
    }
}

#[component]
fn DatasetItem(dataset: DatasetView) -> impl IntoView {
    let store: UrlStore = expect_context();
    let Locale(locale) = expect_context();
    let open = RwSignal::new(false);

    let layers_for_badge = dataset.layers.clone();
    let active_count = move || {
        let selection = store.layers();
        layers_for_badge
            .iter()
            .filter(|layer| selection.contains(&layer.param))
            .count()
    };
    let layers = dataset.layers.clone();
    let source = dataset.source.clone();

    view! {
        <div style="border: 1px solid #e2e8f0; border-radius: 8px; overflow: hidden;">
            <button
                style="display: flex; justify-content: space-between; align-items: center; width: 100%; padding: 10px 12px; border: none; background: #f8fafc; font-size: 0.85rem; font-weight: 600; cursor: pointer; text-align: left;"
                on:click=move |_| open.update(|o| *o = !*o)
            >
                <span>{dataset.title.clone()}</span>
                {move || {
                    let count = active_count();
                    (count > 0)
                        .then(|| {
                            view! {
                                <span style="background: #1d4ed8; color: #fff; border-radius: 9999px; padding: 1px 8px; font-size: 0.7rem;">
                                    {count}
                                </span>
                            }
                        })
                }}
            </button>
            {move || {
                open.get()
                    .then(|| {
                        let layers = layers.clone();
                        let source = source.clone();
                        view! {
                            <div style="padding: 10px 12px; display: flex; flex-direction: column; gap: 8px;">
                                <p style="margin: 0; font-size: 0.78rem; color: #64748b;">
                                    {dataset.description.clone()}
                                </p>
                                {layers
                                    .into_iter()
                                    .map(|layer| {
                                        let param = layer.param.clone();
                                        let param_for_toggle = layer.param.clone();
                                        view! {
                                            <label style="display: flex; align-items: center; gap: 8px; font-size: 0.82rem; cursor: pointer;">
                                                <input
                                                    type="checkbox"
                                                    prop:checked=move || {
                                                        store.layers().contains(&param)
                                                    }
                                                    on:change=move |e| {
                                                        store
                                                            .set_layer_active(
                                                                &param_for_toggle,
                                                                event_target_checked(&e),
                                                            )
                                                    }
                                                />
                                                {layer.title}
                                            </label>
                                        }
                                    })
                                    .collect_view()}
                                {(!source.is_empty())
                                    .then(|| {
                                        view! {
                                            <p style="margin: 0; font-size: 0.72rem; color: #94a3b8;">
                                                {format!(
                                                    "{}: {}",
                                                    t(locale, "data-layers.item.data-sources"),
                                                    source,
                                                )}
                                            </p>
                                        }
                                    })}
                            </div>
                        }
                    })
            }}
        </div>
    }
}

/// Active-layer count and the remove-all action. Hidden while nothing is on.
#[component]
fn BottomBar() -> impl IntoView {
    let store: UrlStore = expect_context();
    let Locale(locale) = expect_context();

    view! {
        {move || {
            let count = store.layers().len();
            (count > 0)
                .then(|| {
                    view! {
                        <div style="display: flex; justify-content: space-between; align-items: center; padding: 10px 16px; border-top: 1px solid #e2e8f0; background: #f8fafc;">
                            <span style="font-size: 0.8rem; color: #334155;">
                                {format!("{count} {}", t(locale, "data-layers.bottom-bar.active"))}
                            </span>
                            <button
                                style="border: none; background: none; color: #1d4ed8; font-size: 0.8rem; cursor: pointer;"
                                on:click=move |_| store.clear_layers()
                            >
                                {t(locale, "data-layers.bottom-bar.remove-all")}
                            </button>
                        </div>
                    }
                })
        }}
    }
}

#[component]
fn AnalysisPanel() -> impl IntoView {
    let store: UrlStore = expect_context();
    let Locale(locale) = expect_context();
    let confirm_leave = RwSignal::new(false);

    let datasets = localized_datasets(locale);
    let filtered = Memo::new(move |_| filter_datasets(&datasets.get(), store.category(), ""));

    view! {
        <div style="display: flex; justify-content: space-between; align-items: center; padding: 16px; border-bottom: 1px solid #e2e8f0;">
            <h2 style="margin: 0; font-size: 1.05rem;">{t(locale, "analysis.title")}</h2>
            <button
                aria-label="close"
                style="border: none; background: none; font-size: 1.2rem; cursor: pointer; color: #64748b;"
                on:click=move |_| confirm_leave.set(true)
            >
                "×"
            </button>
        </div>
        <div style="flex: 1; overflow-y: auto; padding: 16px;">
            <DataLayersList datasets=filtered />
        </div>
        <BottomBar />
        {move || confirm_leave.get().then(|| view! { <CloseDialog confirm_leave=confirm_leave /> })}
    }
}

/// Confirmation dialog shown before abandoning an analysis. Confirming clears
/// every query param and returns to the default view.
#[component]
fn CloseDialog(confirm_leave: RwSignal<bool>) -> impl IntoView {
    let store: UrlStore = expect_context();
    let Locale(locale) = expect_context();

    view! {
        <div style="position: fixed; inset: 0; background: rgba(15, 23, 42, 0.45); display: flex; align-items: center; justify-content: center; z-index: 40;">
            <div style="background: #fff; border-radius: 10px; padding: 20px 24px; max-width: 380px; display: flex; flex-direction: column; gap: 10px;">
                <h3 style="margin: 0; font-size: 1rem;">{t(locale, "analysis.dialog.title")}</h3>
                <p style="margin: 0; font-size: 0.85rem; color: #475569;">
                    {t(locale, "analysis.dialog.body-clear")}
                </p>
                <p style="margin: 0; font-size: 0.85rem; color: #475569;">
                    {t(locale, "analysis.dialog.body-save")}
                </p>
                <div style="display: flex; gap: 8px; justify-content: flex-end; margin-top: 6px;">
                    <button
                        style="padding: 8px 14px; border: 1px solid #cbd5e1; border-radius: 6px; background: #fff; font-size: 0.85rem; cursor: pointer;"
                        on:click=move |_| confirm_leave.set(false)
                    >
                        {t(locale, "analysis.dialog.cancel")}
                    </button>
                    <button
                        style="padding: 8px 14px; border: none; border-radius: 6px; background: #b91c1c; color: #fff; font-size: 0.85rem; cursor: pointer;"
                        on:click=move |_| {
                            confirm_leave.set(false);
                            store.clear_analysis();
                        }
                    >
                        {t(locale, "analysis.dialog.confirm")}
                    </button>
                </div>
            </div>
        </div>
    }
}

/// Secondary panel toggled by the main button while in analysis. Slides open
/// next to the sidebar with the full dataset list.
#[component]
pub fn DatasetsPanel() -> impl IntoView {
    let store: UrlStore = expect_context();
    let Locale(locale) = expect_context();
    let ResizeNonce(resize_nonce) = expect_context();

    let open = move || store.map_status() == MapStatus::Analysis && store.datasets();
    let width = move || {
        if open() {
            format!("{DATASETS_PANEL_WIDTH}px")
        } else {
            "0px".to_string()
        }
    };

    let datasets = localized_datasets(locale);
    let all = Memo::new(move |_| filter_datasets(&datasets.get(), None, ""));

    view! {
        <div
            style="height: 100%; overflow: hidden; transition: width 0.3s ease; background: #f8fafc; border-right: 1px solid #e2e8f0; flex-shrink: 0;"
            style:width=width
            on:transitionend=move |e: web_sys::TransitionEvent| {
                if e.property_name() == "width" {
                    resize_nonce.update(|n| *n = n.wrapping_add(1));
                }
            }
        >
            <div style=format!(
                "width: {DATASETS_PANEL_WIDTH}px; min-width: {DATASETS_PANEL_WIDTH}px; height: 100%; display: flex; flex-direction: column;",
            )>
                <div style="padding: 16px; border-bottom: 1px solid #e2e8f0;">
                    <h3 style="margin: 0; font-size: 0.95rem;">
                        {t(locale, "analysis.all-data")}
                    </h3>
                </div>
                <div style="flex: 1; overflow-y: auto; padding: 16px;">
                    <DataLayersList datasets=all />
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(id: i64, title: &str) -> LayerView {
        LayerView {
            id,
            param: id.to_string(),
            title: title.to_string(),
        }
    }

    fn sample() -> Vec<DatasetView> {
        vec![
            DatasetView {
                id: 1,
                category_id: 10,
                title: "Wildfire history".into(),
                description: "Burn perimeters".into(),
                source: "CWFIS".into(),
                layers: vec![layer(101, "Burned area"), layer(102, "Fire points")],
            },
            DatasetView {
                id: 2,
                category_id: 20,
                title: "Permafrost and treeline".into(),
                description: "Continuous permafrost extent".into(),
                source: "NRCan".into(),
                layers: vec![layer(201, "Permafrost zones")],
            },
        ]
    }

    #[test]
    fn no_filters_keeps_everything() {
        assert_eq!(filter_datasets(&sample(), None, "").len(), 2);
    }

    #[test]
    fn category_filter_is_exact() {
        let out = filter_datasets(&sample(), Some(20), "");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 2);
        assert!(filter_datasets(&sample(), Some(99), "").is_empty());
    }

    #[test]
    fn search_matches_titles_descriptions_and_layers() {
        assert_eq!(filter_datasets(&sample(), None, "WILDFIRE").len(), 1);
        assert_eq!(filter_datasets(&sample(), None, "continuous").len(), 1);
        assert_eq!(filter_datasets(&sample(), None, "fire points").len(), 1);
        assert!(filter_datasets(&sample(), None, "glacier").is_empty());
    }

    #[test]
    fn search_and_category_compose() {
        assert!(filter_datasets(&sample(), Some(20), "wildfire").is_empty());
        assert_eq!(filter_datasets(&sample(), Some(10), "wildfire").len(), 1);
    }

    #[test]
    fn dataset_view_localizes_and_flattens_layers() {
        use boreal_shared::{Dataset, DatasetMetadata, Layer, LayerMetadata, Translatable};
        let dataset = Dataset {
            id: 4,
            category_id: 2,
            metadata: DatasetMetadata {
                title: Translatable::new([("en", "Wildfire history"), ("fr", "Feux passés")]),
                description: Translatable::new([("en", "Burns")]),
                source: Translatable::new([("en", "CWFIS")]),
                citation: Translatable::default(),
            },
            layers: Some(vec![Layer {
                id: 7,
                format: "geojson".into(),
                kind: "vector".into(),
                path: "/layers/7.geojson".into(),
                unit: String::new(),
                metadata: LayerMetadata {
                    title: Translatable::new([("en", "Burned area")]),
                    description: Translatable::default(),
                },
                dataset_id: 4,
            }]),
        };
        let view = dataset_view("fr", &dataset);
        assert_eq!(view.title, "Feux passés");
        assert_eq!(view.description, "Burns");
        assert_eq!(view.layers.len(), 1);
        assert_eq!(view.layers[0].param, "7");
    }
}
