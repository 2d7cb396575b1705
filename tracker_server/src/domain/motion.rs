// Flat-plane motion along a closed polyline. Pure computation, no I/O.

use crate::domain::errors::WaypathError;

// Rough kilometres per degree used to turn road speeds into degree speeds.
const KM_PER_DEGREE: f64 = 111.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Converts a road speed in km/h into degrees per second on the flat plane.
pub fn speed_from_kmh(kmh: f64) -> f64 {
    (kmh / KM_PER_DEGREE) / SECONDS_PER_HOUR
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    // Euclidean distance in degree space, not geodesic.
    fn distance_to(self, other: Coord) -> f64 {
        let dlat = other.lat - self.lat;
        let dlon = other.lon - self.lon;
        (dlat * dlat + dlon * dlon).sqrt()
    }

    fn lerp(self, end: Coord, t: f64) -> Coord {
        Coord {
            lat: self.lat + (end.lat - self.lat) * t,
            lon: self.lon + (end.lon - self.lon) * t,
        }
    }
}

/// Ordered polyline of at least two points, traversed as a loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypath {
    points: Vec<Coord>,
}

impl Waypath {
    pub fn new(points: Vec<Coord>) -> Result<Self, WaypathError> {
        if points.len() < 2 {
            return Err(WaypathError::TooFewPoints { len: points.len() });
        }
        if let Some(index) = points
            .iter()
            .position(|p| !p.lat.is_finite() || !p.lon.is_finite())
        {
            return Err(WaypathError::NonFiniteCoordinate { index });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Coord] {
        &self.points
    }

    pub fn segment_count(&self) -> usize {
        self.points.len() - 1
    }

    fn segment(&self, index: usize) -> (Coord, Coord) {
        (self.points[index], self.points[index + 1])
    }
}

/// Position of one vehicle along its waypath.
///
/// Owned by a single scheduler task; `advance` is the only mutator.
#[derive(Debug, Clone)]
pub struct MotionState {
    path: Waypath,
    segment_index: usize,
    // Fraction of the current segment already covered, kept in [0, 1).
    progress: f64,
    speed_deg_per_sec: f64,
}

impl MotionState {
    pub fn new(path: Waypath, speed_deg_per_sec: f64) -> Result<Self, WaypathError> {
        if !speed_deg_per_sec.is_finite() || speed_deg_per_sec < 0.0 {
            return Err(WaypathError::InvalidSpeed(speed_deg_per_sec));
        }
        Ok(Self {
            path,
            segment_index: 0,
            progress: 0.0,
            speed_deg_per_sec,
        })
    }

    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn speed_deg_per_sec(&self) -> f64 {
        self.speed_deg_per_sec
    }

    pub fn path(&self) -> &Waypath {
        &self.path
    }

    /// Moves the vehicle forward by `dt_seconds` and returns its new position.
    ///
    /// At most one segment boundary is crossed per call: when the segment is finished the
    /// overshoot is dropped and the vehicle sits at the start of the next segment. After the
    /// last segment it wraps back to the first one. Zero-length segments are crossed in a
    /// single call. A negative or non-finite `dt_seconds` does not move the vehicle.
    pub fn advance(&mut self, dt_seconds: f64) -> Coord {
        let dt = if dt_seconds.is_finite() && dt_seconds > 0.0 {
            dt_seconds
        } else {
            0.0
        };

        let (start, end) = self.path.segment(self.segment_index);
        let distance = start.distance_to(end);

        if distance == 0.0 {
            self.progress = 1.0;
        } else {
            self.progress += (self.speed_deg_per_sec * dt) / distance;
        }

        if self.progress >= 1.0 {
            self.progress = 0.0;
            self.segment_index += 1;
            if self.segment_index >= self.path.segment_count() {
                self.segment_index = 0;
            }
        }

        let (start, end) = self.path.segment(self.segment_index);
        start.lerp(end, self.progress)
    }
}
