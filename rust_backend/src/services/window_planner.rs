//! Sources of nightly observing windows.
//!
//! Twilight boundaries are computed upstream; a [`WindowPlanner`] only turns
//! what it is given into the ordered windows the scheduler consumes.

use log::warn;

use crate::core::domain::{NightClass, ObservingWindow};
use crate::error::Result;

/// Supplies `(start, end, classification)` windows in chronological order.
pub trait WindowPlanner {
    fn windows(&self) -> Result<Vec<ObservingWindow>>;
}

/// Windows used exactly as given, sorted by start time.
#[derive(Debug, Clone, Default)]
pub struct WindowTable {
    windows: Vec<ObservingWindow>,
}

impl WindowTable {
    pub fn new(mut windows: Vec<ObservingWindow>) -> Self {
        windows.sort_by_key(|w| w.start());
        for pair in windows.windows(2) {
            if pair[1].start() < pair[0].end() {
                warn!(
                    "Observing windows overlap: {} - {} and {} - {}",
                    pair[0].start(),
                    pair[0].end(),
                    pair[1].start(),
                    pair[1].end()
                );
            }
        }
        Self { windows }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl WindowPlanner for WindowTable {
    fn windows(&self) -> Result<Vec<ObservingWindow>> {
        Ok(self.windows.clone())
    }
}

/// Treats each input window as a full night (twilight to twilight) and cuts
/// it down to the half its classification names.
#[derive(Debug, Clone, Default)]
pub struct HalfNightPlanner {
    nights: WindowTable,
}

impl HalfNightPlanner {
    pub fn new(nights: Vec<ObservingWindow>) -> Self {
        Self {
            nights: WindowTable::new(nights),
        }
    }

    /// The observable part of one night.
    pub fn plan(night: &ObservingWindow) -> Result<ObservingWindow> {
        let midpoint = night.start() + night.duration() / 2;
        match night.classification() {
            NightClass::Full => Ok(*night),
            NightClass::First => ObservingWindow::new(night.start(), midpoint, NightClass::First),
            NightClass::Second => ObservingWindow::new(midpoint, night.end(), NightClass::Second),
        }
    }
}

impl WindowPlanner for HalfNightPlanner {
    fn windows(&self) -> Result<Vec<ObservingWindow>> {
        self.nights.windows()?.iter().map(Self::plan).collect()
    }
}
