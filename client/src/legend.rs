#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

//! Collapsible legend listing the layers currently on the map.

use leptos::prelude::*;

use crate::app::Locale;
use crate::i18n::t;
use crate::queries::{DatasetsQuery, QueryStatus};
use crate::sidebar::dataset_view;
use crate::url_state::UrlStore;

const SWATCHES: [&str; 6] = [
    "#1d4ed8", "#b91c1c", "#047857", "#b45309", "#7c3aed", "#0e7490",
];

#[component]
pub fn MapLegend() -> impl IntoView {
    let store: UrlStore = expect_context();
    let Locale(locale) = expect_context();
    let DatasetsQuery(query) = expect_context();
    let collapsed = RwSignal::new(false);

    // Active layer titles, in activation order
    let entries = Memo::new(move |_| {
        let selection = store.layers();
        let titles: std::collections::HashMap<String, String> = match query.status.get() {
            QueryStatus::Success(resp) => resp
                .data
                .iter()
                .flat_map(|dataset| dataset_view(locale, dataset).layers)
                .map(|layer| (layer.param, layer.title))
                .collect(),
            _ => Default::default(),
        };
        selection
            .ids()
            .iter()
            .map(|id| titles.get(id).cloned().unwrap_or_else(|| id.clone()))
            .collect::<Vec<_>>()
    });

    view! {
        {move || {
            let items = entries.get();
            (!items.is_empty())
                .then(|| {
                    view! {
                        <div style="position: absolute; left: 16px; bottom: 28px; background: #fff; border: 1px solid #e2e8f0; border-radius: 8px; box-shadow: 0 4px 14px rgba(15, 23, 42, 0.12); min-width: 160px; z-index: 15;">
                            <button
                                style="display: flex; justify-content: space-between; width: 100%; padding: 8px 12px; border: none; background: none; font-size: 0.75rem; font-weight: 600; text-transform: uppercase; color: #64748b; cursor: pointer;"
                                on:click=move |_| collapsed.update(|c| *c = !*c)
                            >
                                <span>{t(locale, "map.legend")}</span>
                                <span>{move || if collapsed.get() { "▸" } else { "▾" }}</span>
                            </button>
                            {(!collapsed.get())
                                .then(|| {
                                    view! {
                                        <ul style="margin: 0; padding: 4px 12px 10px; list-style: none; display: flex; flex-direction: column; gap: 5px;">
                                            {items
                                                .iter()
                                                .enumerate()
                                                .map(|(i, title)| {
                                                    view! {
                                                        <li style="display: flex; align-items: center; gap: 8px; font-size: 0.8rem;">
                                                            <span style=format!(
                                                                "width: 12px; height: 12px; border-radius: 3px; background: {};",
                                                                SWATCHES[i % SWATCHES.len()],
                                                            )></span>
                                                            {title.clone()}
                                                        </li>
                                                    }
                                                })
                                                .collect_view()}
                                        </ul>
                                    }
                                })}
                        </div>
                    }
                })
        }}
    }
}
