//! Carrier tracking across windows.
//!
//! Tracks live in an arena indexed by [`TrackId`]. Each window, the
//! active tracks and the window's newly detected pairs are matched by a
//! minimum-cost assignment (Kuhn-Munkres) on
//!
//! ```text
//! cost = frequency_weight * |Δcenter_hz| + power_weight * |Δavg_power_db|
//! ```
//!
//! measured against each track's last observation. A greedy nearest
//! match can swap the identities of two close tracks; the assignment
//! minimizes the total instead. Any individual assignment above
//! `max_assignment_cost` is rejected: the pair starts a new track and the
//! track counts a miss. A track terminates once its consecutive misses
//! exceed `missed_window_limit`.
//!
//! After the run, [`CarrierTracker::finish`] terminates the remaining
//! tracks and merges fragments that continue each other's trajectory
//! across a short gap, which happens when a carrier briefly drops below
//! the SNR gate.

use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;
use serde::Serialize;
use std::fmt;

use crate::config::AnalysisConfig;
use crate::pairs::CarrierPair;

/// Fixed-point scale used to feed float costs to the integer solver.
const COST_SCALE: f64 = 1000.0;

/// Observations used to fit a trajectory for merging.
const MERGE_FIT_OBSERVATIONS: usize = 5;

/// Stable identifier of a track: its index in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackStatus {
    /// Still being matched.
    Active,
    /// Missed too many windows, or the run ended.
    Terminated,
    /// Observations were absorbed by another track.
    Merged(TrackId),
}

/// One carrier pair followed through time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarrierTrack {
    /// Arena id.
    pub id: TrackId,
    /// `(window_index, pair)` in ascending window order.
    pub observations: Vec<(usize, CarrierPair)>,
    /// Lifecycle state.
    pub status: TrackStatus,
    /// Consecutive windows without a match.
    pub missed_count: u32,
}

impl CarrierTrack {
    /// Most recent observation.
    pub fn last(&self) -> Option<&(usize, CarrierPair)> {
        self.observations.last()
    }

    /// First observation.
    pub fn first(&self) -> Option<&(usize, CarrierPair)> {
        self.observations.first()
    }

    /// True while the track can still be matched.
    pub fn is_active(&self) -> bool {
        self.status == TrackStatus::Active
    }

    /// The pair observed in `window_index`, if any.
    pub fn observation_at(&self, window_index: usize) -> Option<&CarrierPair> {
        self.observations
            .binary_search_by_key(&window_index, |(w, _)| *w)
            .ok()
            .map(|i| &self.observations[i].1)
    }

    /// Least-squares line through the last few centers, evaluated at `window_index`.
    fn extrapolate_center(&self, window_index: usize) -> Option<f64> {
        let tail = &self.observations[self.observations.len().saturating_sub(MERGE_FIT_OBSERVATIONS)..];
        let (_, last_pair) = tail.last()?;
        if tail.len() < 2 {
            return Some(last_pair.center_hz);
        }
        let n = tail.len() as f64;
        let mean_x = tail.iter().map(|(w, _)| *w as f64).sum::<f64>() / n;
        let mean_y = tail.iter().map(|(_, p)| p.center_hz).sum::<f64>() / n;
        let sxx: f64 = tail.iter().map(|(w, _)| (*w as f64 - mean_x).powi(2)).sum();
        if sxx <= 0.0 {
            return Some(last_pair.center_hz);
        }
        let sxy: f64 = tail
            .iter()
            .map(|(w, p)| (*w as f64 - mean_x) * (p.center_hz - mean_y))
            .sum();
        let slope = sxy / sxx;
        Some(mean_y + slope * (window_index as f64 - mean_x))
    }
}

/// Matching and lifecycle parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerParams {
    /// Cost per Hz of center change.
    pub frequency_weight: f64,
    /// Cost per dB of power change.
    pub power_weight: f64,
    /// Gate above which an assignment is rejected.
    pub max_assignment_cost: f64,
    /// Consecutive misses a track survives.
    pub missed_window_limit: u32,
    /// Largest window gap bridged by a merge.
    pub merge_max_gap_windows: usize,
    /// Allowed deviation from the extrapolated trajectory for a merge, Hz.
    pub merge_tolerance_hz: f64,
}

impl From<&AnalysisConfig> for TrackerParams {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            frequency_weight: config.frequency_weight,
            power_weight: config.power_weight,
            max_assignment_cost: config.max_assignment_cost,
            missed_window_limit: config.missed_window_limit,
            merge_max_gap_windows: config.merge_max_gap_windows,
            merge_tolerance_hz: config.merge_tolerance_hz,
        }
    }
}

/// Owns every track and folds windows into them in time order.
#[derive(Debug, Clone)]
pub struct CarrierTracker {
    params: TrackerParams,
    tracks: Vec<CarrierTrack>,
}

impl CarrierTracker {
    /// Create an empty tracker.
    pub fn new(params: TrackerParams) -> Self {
        Self {
            params,
            tracks: Vec::new(),
        }
    }

    /// All tracks, indexed by id.
    pub fn tracks(&self) -> &[CarrierTrack] {
        &self.tracks
    }

    /// Look up a track.
    pub fn get(&self, id: TrackId) -> Option<&CarrierTrack> {
        self.tracks.get(id.0 as usize)
    }

    /// Assignment cost between a track's last pair and a new one.
    pub fn cost(&self, last: &CarrierPair, new: &CarrierPair) -> f64 {
        self.params.frequency_weight * (new.center_hz - last.center_hz).abs()
            + self.params.power_weight * (new.avg_power_db - last.avg_power_db).abs()
    }

    fn birth(&mut self, window_index: usize, pair: CarrierPair) -> TrackId {
        let id = TrackId(self.tracks.len() as u32);
        tracing::debug!(track = %id, window = window_index, center_hz = pair.center_hz, "track born");
        self.tracks.push(CarrierTrack {
            id,
            observations: vec![(window_index, pair)],
            status: TrackStatus::Active,
            missed_count: 0,
        });
        id
    }

    /// Fold one window's detected pairs into the track set.
    ///
    /// An empty slice is a window with no carrier: every active track
    /// counts a miss.
    pub fn observe(&mut self, window_index: usize, pairs: &[CarrierPair]) {
        let active: Vec<usize> = self
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_active())
            .map(|(i, _)| i)
            .collect();

        let mut track_matched = vec![false; active.len()];
        let mut pair_matched = vec![false; pairs.len()];

        if !active.is_empty() && !pairs.is_empty() {
            let assignment = self.assign(&active, pairs);
            for (row, col) in assignment {
                let track = &mut self.tracks[active[row]];
                track.observations.push((window_index, pairs[col]));
                track.missed_count = 0;
                track_matched[row] = true;
                pair_matched[col] = true;
            }
        }

        let limit = self.params.missed_window_limit;
        for (row, &idx) in active.iter().enumerate() {
            if track_matched[row] {
                continue;
            }
            let track = &mut self.tracks[idx];
            track.missed_count += 1;
            if track.missed_count > limit {
                track.status = TrackStatus::Terminated;
                tracing::debug!(track = %track.id, window = window_index, "track terminated");
            }
        }

        for (col, pair) in pairs.iter().enumerate() {
            if !pair_matched[col] {
                self.birth(window_index, *pair);
            }
        }
    }

    /// Minimum-cost assignment of active tracks to pairs, gate applied.
    ///
    /// Returns `(row, col)` indices into `active` and `pairs`.
    fn assign(&self, active: &[usize], pairs: &[CarrierPair]) -> Vec<(usize, usize)> {
        let gate = self.params.max_assignment_cost;
        // Anything over the gate is as good as unassigned; clamping keeps
        // those entries from steering the optimum.
        let reject = ((gate * COST_SCALE).round() as i64).saturating_add(1);
        let size = active.len().max(pairs.len());

        let mut weights = Matrix::new(size, size, reject);
        let mut real_costs = vec![vec![f64::INFINITY; pairs.len()]; active.len()];
        for (row, &idx) in active.iter().enumerate() {
            let Some((_, last)) = self.tracks[idx].last() else {
                continue;
            };
            for (col, pair) in pairs.iter().enumerate() {
                let cost = self.cost(last, pair);
                real_costs[row][col] = cost;
                if cost <= gate {
                    weights[(row, col)] = ((cost * COST_SCALE).round() as i64).min(reject);
                }
            }
        }

        let (_, columns) = kuhn_munkres_min(&weights);
        columns
            .into_iter()
            .enumerate()
            .filter(|&(row, col)| row < active.len() && col < pairs.len())
            .filter(|&(row, col)| real_costs[row][col] <= gate)
            .collect()
    }

    /// Terminate every active track and merge co-linear fragments.
    ///
    /// Consumes the tracker and returns the arena.
    pub fn finish(mut self) -> Vec<CarrierTrack> {
        for track in &mut self.tracks {
            if track.is_active() {
                track.status = TrackStatus::Terminated;
            }
        }
        while self.merge_once() {}
        self.tracks
    }

    /// Merge the first qualifying fragment pair. Returns false when none applies.
    fn merge_once(&mut self) -> bool {
        let candidate = (0..self.tracks.len()).find_map(|a| {
            (0..self.tracks.len())
                .find(|&b| a != b && self.can_merge(&self.tracks[a], &self.tracks[b]))
                .map(|b| (a, b))
        });
        let Some((a, b)) = candidate else {
            return false;
        };

        let absorbed = std::mem::take(&mut self.tracks[b].observations);
        let into = self.tracks[a].id;
        self.tracks[b].status = TrackStatus::Merged(into);
        self.tracks[a].observations.extend(absorbed);
        tracing::debug!(track = %into, absorbed = %self.tracks[b].id, "fragments merged");
        true
    }

    /// True when `later` continues `earlier` after a short gap.
    fn can_merge(&self, earlier: &CarrierTrack, later: &CarrierTrack) -> bool {
        if earlier.status != TrackStatus::Terminated || later.status != TrackStatus::Terminated {
            return false;
        }
        let (Some((end, end_pair)), Some((start, start_pair))) = (earlier.last(), later.first()) else {
            return false;
        };
        if start <= end || start - end - 1 > self.params.merge_max_gap_windows {
            return false;
        }
        let Some(predicted) = earlier.extrapolate_center(*start) else {
            return false;
        };
        let tolerance = self.params.merge_tolerance_hz;
        (predicted - start_pair.center_hz).abs() <= tolerance
            && (end_pair.binaural_hz - start_pair.binaural_hz).abs() <= tolerance
    }
}
