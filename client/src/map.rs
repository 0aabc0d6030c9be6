#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

//! Map host: basemap styles, the canvas renderer, and the area-of-interest
//! overlay. Rendering is plain 2d-canvas; tiles come from public slippy-map
//! servers.

use leptos::prelude::*;
use wasm_bindgen::JsCast;

use crate::app::{MapLoadedFlag, MapViewportSignal, RedrawNonce, ResizeNonce};
use crate::tiles;
use crate::url_state::{MapStatus, UrlStore};
use crate::viewport::{TileCoord, Viewport};

/// Basemap selectable from map settings. Serialized into the `basemap` query
/// param.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BasemapId {
    #[default]
    Default,
    Satellite,
}

pub struct BasemapStyle {
    pub id: BasemapId,
    pub label: &'static str,
    url_template: &'static str,
    pub attribution: &'static str,
}

pub const BASEMAPS: [BasemapStyle; 2] = [
    BasemapStyle {
        id: BasemapId::Default,
        label: "Default",
        url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
        attribution: "© OpenStreetMap contributors",
    },
    BasemapStyle {
        id: BasemapId::Satellite,
        label: "Satellite",
        url_template:
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
        attribution: "© Esri, Maxar, Earthstar Geographics",
    },
];

impl BasemapId {
    pub fn as_query(self) -> &'static str {
        match self {
            BasemapId::Default => "default",
            BasemapId::Satellite => "satellite",
        }
    }

    pub fn from_query(raw: &str) -> Option<Self> {
        match raw {
            "default" => Some(BasemapId::Default),
            "satellite" => Some(BasemapId::Satellite),
            _ => None,
        }
    }

    pub fn style(self) -> &'static BasemapStyle {
        match self {
            BasemapId::Default => &BASEMAPS[0],
            BasemapId::Satellite => &BASEMAPS[1],
        }
    }

    pub fn tile_url(self, coord: TileCoord) -> String {
        self.style()
            .url_template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }
}

/// Placeholder area of interest drawn while a shape is active. A real drawing
/// tool would replace this with user geometry.
pub const AOI_BBOX: [f64; 4] = [-100.0, 54.0, -90.0, 59.0];

fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|window| window.device_pixel_ratio())
        .unwrap_or(1.0)
}

/// The map canvas. Panned with pointer drag, zoomed with the wheel; re-renders
/// whenever the viewport, basemap, shape overlay, or canvas size changes.
#[component]
pub fn MapCanvas() -> impl IntoView {
    let store: UrlStore = expect_context();
    let MapViewportSignal(viewport) = expect_context();
    let MapLoadedFlag(map_loaded) = expect_context();
    let ResizeNonce(resize_nonce) = expect_context();
    let RedrawNonce(redraw_nonce) = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let drag_origin: RwSignal<Option<(f64, f64)>> = RwSignal::new(None);

    // Match the backing store to the element's CSS size whenever layout
    // changes (window resize, sidebar width transition).
    Effect::new(move || {
        resize_nonce.get();
        let Some(canvas) = canvas_ref.get() else {
            return;
        };
        let rect = canvas.get_bounding_client_rect();
        let dpr = device_pixel_ratio();
        let w = rect.width().max(1.0);
        let h = rect.height().max(1.0);
        canvas.set_width((w * dpr) as u32);
        canvas.set_height((h * dpr) as u32);
        redraw_nonce.update(|n| *n = n.wrapping_add(1));
    });

    Effect::new(move || {
        redraw_nonce.get();
        let vp = viewport.get();
        let basemap = store.basemap();
        let show_aoi = store.map_shape() || store.map_status() == MapStatus::Analysis;
        let Some(canvas) = canvas_ref.get() else {
            return;
        };
        draw_map(&canvas, &vp, basemap, show_aoi, redraw_nonce);
        if !map_loaded.get_untracked() {
            map_loaded.set(true);
        }
    });

    view! {
        <canvas
            node_ref=canvas_ref
            style="width: 100%; height: 100%; display: block; touch-action: none; background: #dce8e4; cursor: grab;"
            on:pointerdown=move |e: web_sys::PointerEvent| {
                drag_origin.set(Some((e.offset_x() as f64, e.offset_y() as f64)));
                if let Some(canvas) = canvas_ref.get_untracked() {
                    let _ = canvas.set_pointer_capture(e.pointer_id());
                }
            }
            on:pointermove=move |e: web_sys::PointerEvent| {
                let Some((ox, oy)) = drag_origin.get_untracked() else {
                    return;
                };
                let (x, y) = (e.offset_x() as f64, e.offset_y() as f64);
                viewport.update(|vp| vp.pan(x - ox, y - oy));
                drag_origin.set(Some((x, y)));
            }
            on:pointerup=move |_| drag_origin.set(None)
            on:pointercancel=move |_| drag_origin.set(None)
            on:wheel=move |e: web_sys::WheelEvent| {
                e.prevent_default();
                let delta = -e.delta_y() * 0.002;
                let (x, y) = (e.offset_x() as f64, e.offset_y() as f64);
                let Some(canvas) = canvas_ref.get_untracked() else {
                    return;
                };
                let rect = canvas.get_bounding_client_rect();
                viewport.update(|vp| vp.zoom_at(delta, x, y, rect.width(), rect.height()));
            }
        ></canvas>
    }
}

fn draw_map(
    canvas: &web_sys::HtmlCanvasElement,
    vp: &Viewport,
    basemap: BasemapId,
    show_aoi: bool,
    redraw_nonce: RwSignal<u64>,
) {
    let Ok(Some(raw_ctx)) = canvas.get_context("2d") else {
        return;
    };
    let Ok(ctx) = raw_ctx.dyn_into::<web_sys::CanvasRenderingContext2d>() else {
        return;
    };

    let dpr = device_pixel_ratio();
    let w = canvas.width() as f64 / dpr;
    let h = canvas.height() as f64 / dpr;

    let _ = ctx.reset_transform();
    let _ = ctx.scale(dpr, dpr);
    ctx.set_fill_style_str("#dce8e4");
    ctx.fill_rect(0.0, 0.0, w, h);

    for placed in vp.visible_tiles(w, h) {
        match tiles::tile_image(basemap, placed.coord, redraw_nonce) {
            Some(image) => {
                let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
                    &image,
                    placed.screen_x,
                    placed.screen_y,
                    placed.size,
                    placed.size,
                );
            }
            None => {
                ctx.set_fill_style_str("#e8efec");
                ctx.fill_rect(placed.screen_x, placed.screen_y, placed.size, placed.size);
            }
        }
    }

    if show_aoi {
        let [min_lng, min_lat, max_lng, max_lat] = AOI_BBOX;
        let (x0, y0) = vp.lnglat_to_screen(min_lng, max_lat, w, h);
        let (x1, y1) = vp.lnglat_to_screen(max_lng, min_lat, w, h);
        ctx.set_fill_style_str("rgba(59, 130, 246, 0.18)");
        ctx.fill_rect(x0, y0, x1 - x0, y1 - y0);
        ctx.set_stroke_style_str("rgba(37, 99, 235, 0.9)");
        ctx.set_line_width(2.0);
        ctx.stroke_rect(x0, y0, x1 - x0, y1 - y0);
    }

    ctx.set_fill_style_str("rgba(40, 44, 52, 0.65)");
    ctx.set_font("10px sans-serif");
    let _ = ctx.fill_text(basemap.style().attribution, 8.0, h - 8.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basemap_query_values_round_trip() {
        for style in &BASEMAPS {
            assert_eq!(BasemapId::from_query(style.id.as_query()), Some(style.id));
        }
        assert_eq!(BasemapId::from_query("mars"), None);
    }

    #[test]
    fn tile_url_substitutes_coordinates() {
        let coord = TileCoord { z: 5, x: 9, y: 10 };
        assert_eq!(
            BasemapId::Default.tile_url(coord),
            "https://tile.openstreetmap.org/5/9/10.png"
        );
        // Satellite template swaps y before x
        assert!(BasemapId::Satellite.tile_url(coord).ends_with("/5/10/9"));
    }
}
