#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

//! Slippy-map tile cache. Tiles load lazily off HtmlImageElement; the redraw
//! nonce is bumped when a pending tile arrives so the canvas repaints.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

use crate::map::BasemapId;
use crate::viewport::TileCoord;

const MAX_CACHED_TILES: usize = 400;

struct TileEntry {
    image: HtmlImageElement,
    loaded: Rc<Cell<bool>>,
    failed: Rc<Cell<bool>>,
}

thread_local! {
    static TILE_CACHE: RefCell<HashMap<(BasemapId, TileCoord), TileEntry>> =
        RefCell::new(HashMap::new());
}

/// Return the tile image if it is ready to draw, starting a load otherwise.
pub fn tile_image(
    basemap: BasemapId,
    coord: TileCoord,
    redraw_nonce: RwSignal<u64>,
) -> Option<HtmlImageElement> {
    let key = (basemap, coord);

    let cached = TILE_CACHE.with(|cache| {
        cache
            .borrow()
            .get(&key)
            .map(|entry| (entry.image.clone(), entry.loaded.get(), entry.failed.get()))
    });
    if let Some((image, loaded, failed)) = cached {
        return (loaded && !failed).then_some(image);
    }

    let Ok(image) = HtmlImageElement::new() else {
        return None;
    };
    let loaded = Rc::new(Cell::new(false));
    let failed = Rc::new(Cell::new(false));

    let loaded_for_onload = loaded.clone();
    let onload = Closure::<dyn FnMut()>::new(move || {
        loaded_for_onload.set(true);
        redraw_nonce.update(|n| *n = n.wrapping_add(1));
    });
    let failed_for_onerror = failed.clone();
    let onerror = Closure::<dyn FnMut()>::new(move || {
        failed_for_onerror.set(true);
    });
    let onload_js = onload.into_js_value();
    let onerror_js = onerror.into_js_value();
    image.set_onload(Some(onload_js.unchecked_ref()));
    image.set_onerror(Some(onerror_js.unchecked_ref()));
    image.set_cross_origin(Some("anonymous"));
    image.set_src(&basemap.tile_url(coord));

    TILE_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.len() >= MAX_CACHED_TILES {
            // Keep the zoom level currently being drawn, drop the rest
            cache.retain(|(_, cached_coord), _| cached_coord.z == coord.z);
        }
        cache.insert(
            key,
            TileEntry {
                image,
                loaded,
                failed,
            },
        );
    });

    None
}
