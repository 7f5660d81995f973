//! Fault Registry
//!
//! Fixed table of panel fault states, built once at startup and handed to the
//! layout engine and the alert summary. There is no way to inject or clear a
//! fault after construction.

use serde::Serialize;

// ===================== CONSTANTS =====================

/// Panel population of the reference array
pub const DEFAULT_PANEL_SLOTS: usize = 25;

/// Zero-based index of the panel marked faulted in the reference array
pub const DEFAULT_FAULTED_INDEX: usize = 16;

// ===================== REGISTRY =====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaultEntry {
    pub index: usize,
    pub faulted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultRegistry {
    entries: Box<[FaultEntry]>,
}

impl Default for FaultRegistry {
    fn default() -> Self {
        Self::with_faults(DEFAULT_PANEL_SLOTS, &[DEFAULT_FAULTED_INDEX])
    }
}

impl FaultRegistry {
    /// Build a registry of `slots` panels where the listed indices are faulted.
    /// Indices outside the population are ignored.
    pub fn with_faults(slots: usize, faulted: &[usize]) -> Self {
        let entries = (0..slots)
            .map(|index| FaultEntry { index, faulted: faulted.contains(&index) })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Panels beyond the registry are healthy.
    pub fn is_faulted(&self, index: usize) -> bool {
        self.entries.get(index).is_some_and(|e| e.faulted)
    }

    pub fn entries(&self) -> &[FaultEntry] {
        &self.entries
    }

    pub fn faulted_indices(&self) -> Vec<usize> {
        self.entries.iter().filter(|e| e.faulted).map(|e| e.index).collect()
    }

    pub fn alerts(&self) -> Vec<FaultAlert> {
        self.faulted_indices().into_iter().map(FaultAlert::for_index).collect()
    }

    pub fn status(&self) -> ArrayStatus {
        if self.entries.iter().any(|e| e.faulted) {
            ArrayStatus::IssuesDetected
        } else {
            ArrayStatus::Operational
        }
    }
}

// ===================== ALERTS =====================

/// One line of the alert panel. `id` is the one-based panel number shown to
/// operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultAlert {
    pub id: usize,
    pub title: String,
    pub detail: String,
}

impl FaultAlert {
    fn for_index(index: usize) -> Self {
        let id = index + 1;
        Self {
            id,
            title: format!("Panel #{} Malfunction", id),
            detail: "Critical error detected. Maintenance required.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArrayStatus {
    Operational,
    IssuesDetected,
}

impl ArrayStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Operational => "Operational",
            Self::IssuesDetected => "Issues Detected",
        }
    }
}

// ===================== PULSE =====================

/// Brightness multiplier for a faulted panel, oscillating in [0.2, 1.0].
///
/// Driven by wall-clock milliseconds, not simulated time, so the pulse rate
/// does not change with simulation speed.
pub fn pulse_intensity(wall_ms: f64) -> f64 {
    (wall_ms * 0.005).sin() * 0.4 + 0.6
}

// ===================== TESTS =====================
