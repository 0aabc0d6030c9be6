#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

//! Floating map controls: zoom buttons and the settings popover with the
//! basemap picker. Zoom actions are gated until the map has produced its
//! first frame.

use leptos::prelude::*;

use crate::app::{Locale, MapLoadedFlag, MapViewportSignal};
use crate::i18n::t;
use crate::map::BASEMAPS;
use crate::url_state::UrlStore;

const CONTROL_STYLE: &str = "width: 36px; height: 36px; border: 1px solid #cbd5e1; \
     border-radius: 8px; background: #fff; font-size: 1rem; cursor: pointer; \
     display: flex; align-items: center; justify-content: center; \
     box-shadow: 0 2px 6px rgba(15, 23, 42, 0.12);";

/// Explicit open-state for the settings popover, provided by [`MapControls`].
#[derive(Clone, Copy)]
struct SettingsOpen(RwSignal<bool>);

#[component]
pub fn MapControls() -> impl IntoView {
    provide_context(SettingsOpen(RwSignal::new(false)));

    view! {
        <div style="position: absolute; right: 16px; bottom: 28px; display: flex; flex-direction: column; align-items: flex-end; gap: 8px; z-index: 15;">
            <SettingsControl />
            <ZoomControl />
        </div>
    }
}

#[component]
fn ZoomControl() -> impl IntoView {
    let MapViewportSignal(viewport) = expect_context();
    let MapLoadedFlag(map_loaded) = expect_context();
    let Locale(locale) = expect_context();

    view! {
        <div style="display: flex; flex-direction: column; gap: 4px;">
            <button
                style=CONTROL_STYLE
                title=t(locale, "map.controls.zoom-in")
                disabled=move || !map_loaded.get() || viewport.get().at_max_zoom()
                on:click=move |_| viewport.update(|vp| vp.zoom_in())
            >
                "+"
            </button>
            <button
                style=CONTROL_STYLE
                title=t(locale, "map.controls.zoom-out")
                disabled=move || !map_loaded.get() || viewport.get().at_min_zoom()
                on:click=move |_| viewport.update(|vp| vp.zoom_out())
            >
                "−"
            </button>
        </div>
    }
}

#[component]
fn SettingsControl() -> impl IntoView {
    let SettingsOpen(open) = expect_context();
    let Locale(locale) = expect_context();

    view! {
        <div style="position: relative;">
            {move || open.get().then(|| view! { <BasemapControl /> })}
            <button
                style=CONTROL_STYLE
                title=t(locale, "map.controls.settings")
                on:click=move |_| open.update(|o| *o = !*o)
            >
                "⚙"
            </button>
        </div>
    }
}

#[component]
fn BasemapControl() -> impl IntoView {
    let store: UrlStore = expect_context();
    let Locale(locale) = expect_context();

    view! {
        <div style="position: absolute; right: 44px; bottom: 0; background: #fff; border: 1px solid #e2e8f0; border-radius: 8px; padding: 10px 12px; min-width: 140px; box-shadow: 0 4px 14px rgba(15, 23, 42, 0.15); display: flex; flex-direction: column; gap: 6px;">
            <span style="font-size: 0.75rem; font-weight: 600; color: #64748b; text-transform: uppercase;">
                {t(locale, "map.controls.basemap.title")}
            </span>
            {BASEMAPS
                .iter()
                .map(|style| {
                    let id = style.id;
                    view! {
                        <button
                            style=move || {
                                format!(
                                    "padding: 6px 10px; border-radius: 6px; border: 1px solid {}; background: {}; font-size: 0.8rem; cursor: pointer; text-align: left;",
                                    if store.basemap() == id { "#1d4ed8" } else { "#e2e8f0" },
                                    if store.basemap() == id { "#eff6ff" } else { "#fff" },
                                )
                            }
                            on:click=move |_| store.set_basemap(id)
                        >
                            {style.label}
                        </button>
                    }
                })
                .collect_view()}
        </div>
    }
}
