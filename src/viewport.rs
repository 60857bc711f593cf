use std::fmt::Display;
use tokio::sync::watch;

pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 22.0;
/// Web mercator latitude limit
pub const MAX_LATITUDE: f64 = 85.05112878;
pub const DEFAULT_STYLE: &str = "mapbox://styles/mapbox/satellite-v9";

#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub pitch: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            longitude: 7.8,
            latitude: 48.0,
            zoom: 6.0,
            pitch: 45.0,
        }
    }
}

/// In-memory map camera that publishes every zoom change.
#[derive(Debug)]
pub struct MapViewport {
    view: ViewState,
    style: String,
    zoom_tx: watch::Sender<f64>,
}

impl MapViewport {
    pub fn new(view: ViewState, style: impl Into<String>) -> Self {
        let view = ViewState {
            longitude: wrap_longitude(view.longitude),
            latitude: view.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            zoom: clamp_zoom(view.zoom).unwrap_or(ViewState::default().zoom),
            pitch: view.pitch,
        };
        let (zoom_tx, _) = watch::channel(view.zoom);
        Self {
            view,
            style: style.into(),
            zoom_tx,
        }
    }

    /// Receiver that observes the current zoom and is marked changed on every zoom change
    pub fn subscribe_zoom(&self) -> watch::Receiver<f64> {
        self.zoom_tx.subscribe()
    }

    /// Set the zoom, clamped to the supported range. NaN is ignored.
    pub fn zoom_to(&mut self, zoom: f64) -> f64 {
        if let Some(zoom) = clamp_zoom(zoom) {
            if zoom != self.view.zoom {
                self.view.zoom = zoom;
                self.zoom_tx.send_replace(zoom);
            }
        }
        self.view.zoom
    }

    pub fn zoom_by(&mut self, delta: f64) -> f64 {
        self.zoom_to(self.view.zoom + delta)
    }

    /// Move the center, longitude wraps and latitude is clamped
    pub fn pan_by(&mut self, delta_longitude: f64, delta_latitude: f64) {
        if !delta_longitude.is_finite() || !delta_latitude.is_finite() {
            return;
        }
        self.view.longitude = wrap_longitude(self.view.longitude + delta_longitude);
        self.view.latitude =
            (self.view.latitude + delta_latitude).clamp(-MAX_LATITUDE, MAX_LATITUDE);
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn zoom(&self) -> f64 {
        self.view.zoom
    }

    pub fn center(&self) -> (f64, f64) {
        (self.view.longitude, self.view.latitude)
    }

    pub fn style(&self) -> &str {
        &self.style
    }
}

impl Default for MapViewport {
    fn default() -> Self {
        Self::new(ViewState::default(), DEFAULT_STYLE)
    }
}

impl Display for MapViewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.4}, {:.4}) zoom {:.1} pitch {:.0} [{}]",
            self.view.longitude, self.view.latitude, self.view.zoom, self.view.pitch, self.style
        )
    }
}

fn clamp_zoom(zoom: f64) -> Option<f64> {
    (!zoom.is_nan()).then(|| zoom.clamp(MIN_ZOOM, MAX_ZOOM))
}

fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        longitude
    } else {
        (longitude + 180.0).rem_euclid(360.0) - 180.0
    }
}
