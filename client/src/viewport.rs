/// Viewport manages the pan/zoom transformation between geographic coordinates
/// (lng/lat, web-mercator) and canvas pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub lng: f64,
    pub lat: f64,
    pub zoom: f64,
}

pub const MIN_ZOOM: f64 = 2.0;
pub const MAX_ZOOM: f64 = 15.0;
const TILE_SIZE: f64 = 256.0;
const MAX_MERCATOR_LAT: f64 = 85.051_128;

/// Initial view: northern boreal region, roughly the Canadian North.
pub const DEFAULT_BBOX: [f64; 4] = [-112.0, 50.0, -56.0, 64.0];
pub const DEFAULT_ZOOM: f64 = 5.0;

impl Default for Viewport {
    fn default() -> Self {
        let [min_lng, min_lat, max_lng, max_lat] = DEFAULT_BBOX;
        Self {
            lng: (min_lng + max_lng) / 2.0,
            lat: (min_lat + max_lat) / 2.0,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// Mercator-normalized x in [0, 1).
fn mercator_x(lng: f64) -> f64 {
    (lng + 180.0) / 360.0
}

/// Mercator-normalized y in [0, 1); y grows southward.
fn mercator_y(lat: f64) -> f64 {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let rad = lat.to_radians();
    (1.0 - (rad.tan() + 1.0 / rad.cos()).ln() / std::f64::consts::PI) / 2.0
}

fn inverse_mercator_x(x: f64) -> f64 {
    x * 360.0 - 180.0
}

fn inverse_mercator_y(y: f64) -> f64 {
    let n = std::f64::consts::PI * (1.0 - 2.0 * y);
    n.sinh().atan().to_degrees()
}

impl Viewport {
    /// Side length of the mercator world square in pixels at the current zoom.
    pub fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }

    /// Convert lng/lat to screen coordinates for a canvas of the given size.
    pub fn lnglat_to_screen(&self, lng: f64, lat: f64, w: f64, h: f64) -> (f64, f64) {
        let size = self.world_size();
        let cx = mercator_x(self.lng) * size;
        let cy = mercator_y(self.lat) * size;
        (
            mercator_x(lng) * size - cx + w / 2.0,
            mercator_y(lat) * size - cy + h / 2.0,
        )
    }

    /// Convert screen coordinates back to lng/lat.
    pub fn screen_to_lnglat(&self, sx: f64, sy: f64, w: f64, h: f64) -> (f64, f64) {
        let size = self.world_size();
        let cx = mercator_x(self.lng) * size;
        let cy = mercator_y(self.lat) * size;
        let x = ((sx - w / 2.0 + cx) / size).rem_euclid(1.0);
        let y = ((sy - h / 2.0 + cy) / size).clamp(0.0, 1.0);
        (inverse_mercator_x(x), inverse_mercator_y(y))
    }

    /// Pan by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let size = self.world_size();
        let x = (mercator_x(self.lng) - dx / size).rem_euclid(1.0);
        let y = (mercator_y(self.lat) - dy / size).clamp(0.0, 1.0);
        self.lng = inverse_mercator_x(x);
        self.lat = inverse_mercator_y(y);
    }

    /// Zoom toward a focus point (screen coordinates) so the location under the
    /// cursor stays fixed.
    pub fn zoom_at(&mut self, delta: f64, sx: f64, sy: f64, w: f64, h: f64) {
        let (focus_lng, focus_lat) = self.screen_to_lnglat(sx, sy, w, h);
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        // Re-center so the focus point lands back under the cursor
        let (nx, ny) = self.lnglat_to_screen(focus_lng, focus_lat, w, h);
        self.pan(sx - nx, sy - ny);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1.0).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - 1.0).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn at_min_zoom(&self) -> bool {
        self.zoom <= MIN_ZOOM
    }

    pub fn at_max_zoom(&self) -> bool {
        self.zoom >= MAX_ZOOM
    }

    /// Fit the viewport to the given lng/lat bounds with padding.
    pub fn fit_bounds(&mut self, bounds: [f64; 4], w: f64, h: f64) {
        let [min_lng, min_lat, max_lng, max_lat] = bounds;
        let span_x = mercator_x(max_lng) - mercator_x(min_lng);
        let span_y = mercator_y(min_lat) - mercator_y(max_lat);
        if span_x <= 0.0 || span_y <= 0.0 || w <= 0.0 || h <= 0.0 {
            return;
        }

        let padding = 0.05;
        let scale_x = w / (span_x * TILE_SIZE * (1.0 + padding * 2.0));
        let scale_y = h / (span_y * TILE_SIZE * (1.0 + padding * 2.0));
        self.zoom = scale_x.min(scale_y).log2().clamp(MIN_ZOOM, MAX_ZOOM);
        self.lng = (min_lng + max_lng) / 2.0;
        self.lat = inverse_mercator_y((mercator_y(min_lat) + mercator_y(max_lat)) / 2.0);
    }

    /// Integer tile zoom used for slippy-map tile requests.
    pub fn tile_zoom(&self) -> u8 {
        self.zoom.floor().clamp(0.0, 19.0) as u8
    }

    /// Tiles covering the canvas at the current view, with their screen placement.
    pub fn visible_tiles(&self, w: f64, h: f64) -> Vec<PlacedTile> {
        let z = self.tile_zoom();
        let tiles_per_axis = 1u32 << z;
        // Screen size of one tile when zoom is fractional
        let tile_px = self.world_size() / tiles_per_axis as f64;

        let size = self.world_size();
        let cx = mercator_x(self.lng) * size;
        let cy = mercator_y(self.lat) * size;
        let left = cx - w / 2.0;
        let top = cy - h / 2.0;

        let x0 = (left / tile_px).floor() as i64;
        let x1 = ((left + w) / tile_px).ceil() as i64;
        let y0 = ((top / tile_px).floor() as i64).max(0);
        let y1 = (((top + h) / tile_px).ceil() as i64).min(tiles_per_axis as i64);

        let mut out = Vec::new();
        for ty in y0..y1 {
            for tx in x0..x1 {
                let coord = TileCoord {
                    z,
                    x: tx.rem_euclid(tiles_per_axis as i64) as u32,
                    y: ty as u32,
                };
                out.push(PlacedTile {
                    coord,
                    screen_x: tx as f64 * tile_px - left,
                    screen_y: ty as f64 * tile_px - top,
                    size: tile_px,
                });
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

/// A tile coordinate plus where it lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTile {
    pub coord: TileCoord,
    pub screen_x: f64,
    pub screen_y: f64,
    pub size: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_view_centers_on_boreal_bbox() {
        let vp = Viewport::default();
        assert!((vp.lng - (-84.0)).abs() < 1e-9);
        assert!((vp.lat - 57.0).abs() < 1e-9);
        assert!((vp.zoom - 5.0).abs() < 1e-9);
    }

    #[test]
    fn screen_round_trip_recovers_coordinates() {
        let vp = Viewport::default();
        let (sx, sy) = vp.lnglat_to_screen(-90.0, 55.0, 1200.0, 800.0);
        let (lng, lat) = vp.screen_to_lnglat(sx, sy, 1200.0, 800.0);
        assert!((lng - (-90.0)).abs() < 1e-6);
        assert!((lat - 55.0).abs() < 1e-6);
    }

    #[test]
    fn viewport_center_maps_to_canvas_center() {
        let vp = Viewport::default();
        let (sx, sy) = vp.lnglat_to_screen(vp.lng, vp.lat, 1000.0, 600.0);
        assert!((sx - 500.0).abs() < 1e-9);
        assert!((sy - 300.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_steps_clamp_to_range() {
        let mut vp = Viewport {
            lng: 0.0,
            lat: 0.0,
            zoom: MAX_ZOOM,
        };
        vp.zoom_in();
        assert_eq!(vp.zoom, MAX_ZOOM);
        vp.zoom = MIN_ZOOM;
        vp.zoom_out();
        assert_eq!(vp.zoom, MIN_ZOOM);
    }

    #[test]
    fn zoom_at_keeps_focus_point_fixed() {
        let mut vp = Viewport::default();
        let (w, h) = (1200.0, 800.0);
        let (before_lng, before_lat) = vp.screen_to_lnglat(300.0, 200.0, w, h);
        vp.zoom_at(1.0, 300.0, 200.0, w, h);
        let (after_lng, after_lat) = vp.screen_to_lnglat(300.0, 200.0, w, h);
        assert!((before_lng - after_lng).abs() < 1e-6);
        assert!((before_lat - after_lat).abs() < 1e-6);
    }

    #[test]
    fn visible_tiles_cover_the_canvas() {
        let vp = Viewport::default();
        let (w, h) = (1024.0, 768.0);
        let tiles = vp.visible_tiles(w, h);
        assert!(!tiles.is_empty());
        let covered: f64 = tiles.iter().map(|t| t.size * t.size).sum();
        assert!(covered >= w * h);
        for t in &tiles {
            assert_eq!(t.coord.z, 5);
            assert!(t.coord.x < 32);
            assert!(t.coord.y < 32);
        }
    }

    #[test]
    fn fit_bounds_contains_the_requested_area() {
        let mut vp = Viewport {
            lng: 0.0,
            lat: 0.0,
            zoom: 10.0,
        };
        let (w, h) = (1200.0, 800.0);
        vp.fit_bounds(DEFAULT_BBOX, w, h);
        let [min_lng, min_lat, max_lng, max_lat] = DEFAULT_BBOX;
        let (x0, y0) = vp.lnglat_to_screen(min_lng, max_lat, w, h);
        let (x1, y1) = vp.lnglat_to_screen(max_lng, min_lat, w, h);
        assert!(x0 >= 0.0 && y0 >= 0.0);
        assert!(x1 <= w && y1 <= h);
        assert!(x1 > x0 && y1 > y0);
    }

    #[test]
    fn pan_shifts_center_westward() {
        let mut vp = Viewport::default();
        let before = vp.lng;
        vp.pan(100.0, 0.0);
        assert!(vp.lng < before);
    }
}
