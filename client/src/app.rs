#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::RefCell;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use crate::analyze::AnalyzeButton;
use crate::controls::MapControls;
use crate::i18n;
use crate::legend::MapLegend;
use crate::map::MapCanvas;
use crate::queries::{
    self, CATEGORIES_URL, CategoriesQuery, DATASETS_URL, DatasetsQuery, ensure_fetch,
};
use crate::sidebar::{DatasetsPanel, MapSidebar};
use crate::top_bar::TopBar;
use crate::url_state::{UrlState, UrlStore};
use crate::viewport::Viewport;

pub(crate) const SIDEBAR_WIDTH: f64 = 340.0;
pub(crate) const DATASETS_PANEL_WIDTH: f64 = 288.0;

/// Active UI locale, resolved once from the URL path at mount.
#[derive(Clone, Copy)]
pub(crate) struct Locale(pub &'static str);

/// Newtype wrappers so each signal gets a distinct Leptos context type.
#[derive(Clone, Copy)]
pub(crate) struct MapViewportSignal(pub RwSignal<Viewport>);
#[derive(Clone, Copy)]
pub(crate) struct MapLoadedFlag(pub RwSignal<bool>);
/// Bumped when the map container's size may have changed (window resize,
/// sidebar width transition). The canvas re-measures itself on every bump.
#[derive(Clone, Copy)]
pub(crate) struct ResizeNonce(pub RwSignal<u64>);
/// Bumped when something non-reactive (a tile arriving) needs a repaint.
#[derive(Clone, Copy)]
pub(crate) struct RedrawNonce(pub RwSignal<u64>);

struct PopstateBinding {
    window: web_sys::Window,
    handler: Closure<dyn Fn(web_sys::PopStateEvent)>,
}

struct WindowResizeBinding {
    window: web_sys::Window,
    handler: Closure<dyn Fn()>,
}

thread_local! {
    static POPSTATE_BINDING: RefCell<Option<PopstateBinding>> = const { RefCell::new(None) };
    static RESIZE_BINDING: RefCell<Option<WindowResizeBinding>> = const { RefCell::new(None) };
}

/// Back/forward navigation re-applies the decoded query to the store; the
/// browser already owns the URL at that point, so no history write happens.
fn install_popstate_listener(store: UrlStore) {
    let Some(window) = web_sys::window() else {
        return;
    };
    POPSTATE_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            let _ = old.window.remove_event_listener_with_callback(
                "popstate",
                old.handler.as_ref().unchecked_ref(),
            );
        }
        let handler = Closure::<dyn Fn(web_sys::PopStateEvent)>::new(move |_| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let Ok(search) = window.location().search() else {
                return;
            };
            store.apply(UrlState::decode(&search));
        });
        let _ = window
            .add_event_listener_with_callback("popstate", handler.as_ref().unchecked_ref());
        *slot.borrow_mut() = Some(PopstateBinding { window, handler });
    });
}

fn install_resize_listener(resize_nonce: RwSignal<u64>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    RESIZE_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            let _ = old.window.remove_event_listener_with_callback(
                "resize",
                old.handler.as_ref().unchecked_ref(),
            );
        }
        let handler = Closure::<dyn Fn()>::new(move || {
            resize_nonce.update(|n| *n = n.wrapping_add(1));
        });
        let _ =
            window.add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref());
        *slot.borrow_mut() = Some(WindowResizeBinding { window, handler });
    });
}

#[component]
pub fn App() -> impl IntoView {
    let locale = i18n::current_locale();
    provide_context(Locale(locale));

    let store = UrlStore::from_location();
    provide_context(store);

    let viewport = RwSignal::new(Viewport::default());
    provide_context(MapViewportSignal(viewport));
    provide_context(MapLoadedFlag(RwSignal::new(false)));
    let resize_nonce = RwSignal::new(0u64);
    provide_context(ResizeNonce(resize_nonce));
    provide_context(RedrawNonce(RwSignal::new(0u64)));

    queries::provide_queries();
    let CategoriesQuery(categories) = expect_context();
    let DatasetsQuery(datasets) = expect_context();
    Effect::new(move || {
        ensure_fetch(categories, CATEGORIES_URL);
        ensure_fetch(datasets, DATASETS_URL);
    });

    install_popstate_listener(store);
    install_resize_listener(resize_nonce);

    view! {
        <div style="display: flex; flex-direction: column; height: 100vh; font-family: system-ui, sans-serif; color: #1e293b;">
            <TopBar />
            <div style="position: relative; display: flex; flex: 1; min-height: 0;">
                <MapSidebar />
                <DatasetsPanel />
                <div style="position: relative; flex: 1; min-width: 0;">
                    <MapCanvas />
                    <AnalyzeButton />
                    <MapControls />
                    <MapLegend />
                </div>
            </div>
        </div>
    }
}
