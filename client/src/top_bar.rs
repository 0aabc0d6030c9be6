#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use leptos::prelude::*;

use crate::app::Locale;
use crate::i18n::{SUPPORTED_LOCALES, path_for_locale, t};

#[component]
pub fn TopBar() -> impl IntoView {
    let Locale(locale) = expect_context();

    view! {
        <header style="display: flex; align-items: center; justify-content: space-between; padding: 0 20px; height: 52px; background: #0f172a; color: #f1f5f9; flex-shrink: 0;">
            <div style="display: flex; align-items: center; gap: 24px;">
                <span style="font-size: 1rem; font-weight: 700;">{t(locale, "top-bar.title")}</span>
                <nav style="display: flex; gap: 14px; font-size: 0.85rem;">
                    <a href=format!("/{locale}") style="color: #f1f5f9; text-decoration: none;">
                        {t(locale, "top-bar.navigation.map")}
                    </a>
                    <a
                        href=format!("/{locale}/about")
                        style="color: #94a3b8; text-decoration: none;"
                    >
                        {t(locale, "top-bar.navigation.about")}
                    </a>
                </nav>
            </div>
            <LanguageSelect />
        </header>
    }
}

/// Locale switcher. Navigates to the same page under the other locale prefix,
/// keeping the query string so the map state survives the switch.
#[component]
fn LanguageSelect() -> impl IntoView {
    let Locale(locale) = expect_context();

    let switch = move |e: web_sys::Event| {
        let chosen = event_target_value(&e);
        let Some(window) = web_sys::window() else {
            return;
        };
        let location = window.location();
        let pathname = location.pathname().unwrap_or_default();
        let query = location.search().unwrap_or_default();
        let _ = location.assign(&path_for_locale(&pathname, &query, &chosen));
    };

    view! {
        <select
            aria-label=t(locale, "top-bar.language")
            style="background: #1e293b; color: #f1f5f9; border: 1px solid #334155; border-radius: 6px; padding: 4px 8px; font-size: 0.8rem;"
            on:change=switch
        >
            {SUPPORTED_LOCALES
                .iter()
                .map(|code| {
                    view! {
                        <option value=*code selected=*code == locale>
                            {code.to_uppercase()}
                        </option>
                    }
                })
                .collect_view()}
        </select>
    }
}
