#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

//! Analyze-area flow: the main button floating over the map and the upload
//! bar popover. The popover is open exactly while the map is in upload mode,
//! so its visibility survives reloads and back/forward navigation.

use leptos::prelude::*;

use crate::app::Locale;
use crate::i18n::t;
use crate::url_state::{MapStatus, UrlStore};

const BUTTON_STYLE: &str = "padding: 10px 22px; border: none; border-radius: 9999px; \
     background: #1d4ed8; color: #fff; font-size: 0.9rem; font-weight: 600; \
     cursor: pointer; box-shadow: 0 4px 12px rgba(15, 23, 42, 0.25);";

const BAR_BUTTON_STYLE: &str = "padding: 8px 16px; border: 1px solid #cbd5e1; \
     border-radius: 6px; background: #fff; font-size: 0.85rem; cursor: pointer;";

#[component]
pub fn AnalyzeButton() -> impl IntoView {
    let store: UrlStore = expect_context();
    let Locale(locale) = expect_context();

    let label = move || match store.map_status() {
        MapStatus::Default => t(locale, "map.analyze.button"),
        MapStatus::Upload => t(locale, "map.analyze.cancel"),
        MapStatus::Analysis => t(locale, "map.analyze.datasets"),
    };
    let tooltip = move || match store.map_status() {
        MapStatus::Default => t(locale, "map.analyze.tooltip"),
        _ => String::new(),
    };
    let on_main_click = move |_| match store.map_status_untracked() {
        MapStatus::Default => store.set_map_status(MapStatus::Upload),
        MapStatus::Upload => store.cancel_upload(),
        MapStatus::Analysis => store.set_datasets(!store.datasets_untracked()),
    };
    // Clicking outside closes the popover, except mid-analysis where the
    // state machine owns the transition.
    let on_outside_click = move |_| {
        if store.map_status_untracked() == MapStatus::Analysis {
            return;
        }
        store.cancel_upload();
    };
    let popover_open = move || store.map_status() == MapStatus::Upload;

    view! {
        <div style="position: absolute; top: 16px; left: 50%; transform: translateX(-50%); z-index: 20; display: flex; flex-direction: column; align-items: center; gap: 10px;">
            {move || {
                popover_open()
                    .then(|| {
                        view! {
                            <div
                                style="position: fixed; inset: 0; z-index: -1;"
                                on:click=on_outside_click
                            ></div>
                        }
                    })
            }}
            <button style=BUTTON_STYLE title=tooltip on:click=on_main_click>
                {label}
            </button>
            {move || popover_open().then(|| view! { <UploadBar /> })}
        </div>
    }
}

/// Two-step bar shown in upload mode: stage a shape, then clear or confirm it.
#[component]
fn UploadBar() -> impl IntoView {
    let store: UrlStore = expect_context();
    let Locale(locale) = expect_context();

    view! {
        <div style="background: #fff; border: 1px solid #e2e8f0; border-radius: 10px; padding: 14px 18px; max-width: 420px; box-shadow: 0 8px 24px rgba(15, 23, 42, 0.18); display: flex; flex-direction: column; gap: 10px;">
            {move || {
                if store.map_shape() {
                    view! {
                        <p style="margin: 0; font-size: 0.85rem; color: #475569;">
                            {t(locale, "map.analyze.verify")}
                        </p>
                        <div style="display: flex; gap: 8px; justify-content: flex-end;">
                            <button
                                style=BAR_BUTTON_STYLE
                                on:click=move |_| store.set_map_shape(false)
                            >
                                {t(locale, "map.analyze.clear")}
                            </button>
                            <button
                                style="padding: 8px 16px; border: none; border-radius: 6px; background: #1d4ed8; color: #fff; font-size: 0.85rem; cursor: pointer;"
                                on:click=move |_| store.confirm_analysis()
                            >
                                {t(locale, "map.analyze.confirm")}
                            </button>
                        </div>
                    }
                        .into_any()
                } else {
                    view! {
                        <p style="margin: 0; font-size: 0.85rem; color: #475569;">
                            {t(locale, "map.analyze.prompt")}
                        </p>
                        <div style="display: flex; justify-content: flex-end;">
                            <button
                                style=BAR_BUTTON_STYLE
                                on:click=move |_| store.set_map_shape(true)
                            >
                                {t(locale, "map.analyze.upload")}
                            </button>
                        </div>
                    }
                        .into_any()
                }
            }}
        </div>
    }
}
