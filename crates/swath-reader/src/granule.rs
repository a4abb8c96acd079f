//! Granule selection by time window or area.

use chrono::{DateTime, Utc};
use geo::{Coord, Intersects, LineString, Polygon};
use tracing::debug;

use crate::config::ReaderSection;
use crate::error::{ReaderError, Result};
use crate::handler::{FileHandler, Ring};

/// Selection criteria for granules.
///
/// An area takes precedence over times. Without a start time every granule
/// is kept. A start time alone keeps the granule covering that instant; a
/// start and end keep every granule starting or ending inside the window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GranuleFilter {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub area: Option<Polygon<f64>>,
}

impl GranuleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults taken from a reader section.
    pub fn from_reader(reader: &ReaderSection) -> Self {
        Self {
            start_time: reader.start_time,
            end_time: reader.end_time,
            area: reader.area.as_deref().map(polygon_from_lonlats),
        }
    }

    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.start_time = Some(time);
        self.end_time = None;
        self
    }

    pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn area(mut self, area: Polygon<f64>) -> Self {
        self.area = Some(area);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.start_time.is_none() && self.area.is_none()
    }

    /// Whether a granule spanning `[start, end]` passes the time criteria.
    pub fn keeps_times(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        match (self.start_time, self.end_time) {
            (None, _) => true,
            (Some(t), None) => start <= t && t <= end,
            (Some(from), Some(to)) => {
                (from <= start && start <= to) || (from <= end && end <= to)
            }
        }
    }

    pub fn keeps(&self, handler: &dyn FileHandler) -> Result<bool> {
        if let Some(area) = &self.area {
            let ring = handler.ring_lonlats().ok_or_else(|| {
                ReaderError::UnsupportedFilter(format!(
                    "granule selection by area is not supported for {}",
                    handler.filename()
                ))
            })?;
            return Ok(ring_polygon(&ring).intersects(area));
        }
        Ok(self.keeps_times(handler.start_time(), handler.end_time()))
    }

    /// Keep the selected granules, ordered by start time.
    pub fn apply(&self, handlers: Vec<Box<dyn FileHandler>>) -> Result<Vec<Box<dyn FileHandler>>> {
        let total = handlers.len();
        let mut kept = Vec::with_capacity(total);
        for handler in handlers {
            if self.keeps(handler.as_ref())? {
                kept.push(handler);
            }
        }
        kept.sort_by_key(|h| h.start_time());
        debug!(kept = kept.len(), total, "Selected granules");
        Ok(kept)
    }
}

fn ring_polygon(ring: &Ring) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = ring
        .lons
        .iter()
        .zip(&ring.lats)
        .map(|(&x, &y)| Coord { x, y })
        .collect();
    Polygon::new(LineString::new(coords), vec![])
}

/// Polygon from `[lon, lat]` boundary vertices.
pub fn polygon_from_lonlats(points: &[[f64; 2]]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = points.iter().map(|&[x, y]| Coord { x, y }).collect();
    Polygon::new(LineString::new(coords), vec![])
}
