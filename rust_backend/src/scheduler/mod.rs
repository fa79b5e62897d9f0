//! Night-by-night scheduling loop.
//!
//! The [`Scheduler`] owns the catalog, the tactician and the growing
//! chronology. For each observing window it opens the night, asks the
//! tactician for a field, records the decision and advances the simulated
//! clock until the window closes or the catalog runs out.


use std::ops::ControlFlow;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use qtty::{Degrees, Seconds};
use serde::{Deserialize, Serialize};

use crate::core::checksum::catalog_checksum;
use crate::core::domain::{
    Chronology, ChronologyEntry, FieldCatalog, NightClass, ObservingWindow,
};
use crate::error::{Result, SchedulerError};
use crate::tactician::{Tactician, TacticianConfig};

fn default_retry_interval() -> Seconds {
    Seconds::new(600.0)
}

fn default_overhead() -> Seconds {
    Seconds::new(30.0)
}

/// Extra settling time charged after a long slew.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlewPenalty {
    /// Slews longer than this are penalized.
    pub threshold: Degrees,
    pub delay: Seconds,
}

/// Scheduler settings, usually read from the `[scheduler]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Clock advance when no field is viable.
    #[serde(default = "default_retry_interval")]
    pub retry_interval: Seconds,
    /// Readout and settling time added to every exposure.
    #[serde(default = "default_overhead")]
    pub overhead: Seconds,
    #[serde(default)]
    pub slew_penalty: Option<SlewPenalty>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            retry_interval: default_retry_interval(),
            overhead: default_overhead(),
            slew_penalty: None,
        }
    }
}

impl SchedulerConfig {
    /// Step lengths must be finite and no longer than a day.
    pub fn validate(&self) -> Result<()> {
        check_step("retry_interval", self.retry_interval.value(), false)?;
        check_step("overhead", self.overhead.value(), true)?;
        if let Some(penalty) = &self.slew_penalty {
            if !penalty.threshold.value().is_finite() || penalty.threshold.value() < 0.0 {
                return Err(SchedulerError::configuration(
                    "slew_penalty.threshold must not be negative",
                ));
            }
            check_step("slew_penalty.delay", penalty.delay.value(), true)?;
        }
        Ok(())
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every window was processed.
    Completed,
    /// No unobserved fields remain.
    CatalogExhausted,
    /// The entry callback asked to stop.
    Cancelled,
}

/// What happened during one observing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightSummary {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub classification: NightClass,
    pub entries: usize,
    pub idle_retries: usize,
}

/// Outcome of [`Scheduler::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub nights: Vec<NightSummary>,
    /// Entries recorded by this call.
    pub entries: usize,
    pub remaining: usize,
    pub catalog_checksum: String,
}

/// Longest configurable clock step (one day).
const MAX_STEP_SECONDS: f64 = 86_400.0;

/// Bound on a single advance, well inside chrono's `TimeDelta` range.
const MAX_ADVANCE_MILLIS: f64 = 1.0e15;

/// `clock + seconds`, or `None` when the result is not representable.
fn advance_clock(clock: DateTime<Utc>, seconds: Seconds) -> Option<DateTime<Utc>> {
    let millis = (seconds.value() * 1000.0).round();
    if !millis.is_finite() || millis.abs() > MAX_ADVANCE_MILLIS {
        return None;
    }
    clock.checked_add_signed(Duration::milliseconds(millis as i64))
}

fn check_step(name: &str, value: f64, allow_zero: bool) -> Result<()> {
    let lower_ok = if allow_zero { value >= 0.0 } else { value > 0.0 };
    if !value.is_finite() || !lower_ok || value > MAX_STEP_SECONDS {
        let lower = if allow_zero { "0" } else { "above 0" };
        return Err(SchedulerError::configuration(format!(
            "{} {} s must be {} and at most {} s",
            name, value, lower, MAX_STEP_SECONDS
        )));
    }
    Ok(())
}

/// Drives the tactician across observing windows.
#[derive(Debug)]
pub struct Scheduler {
    catalog: FieldCatalog,
    tactician: Tactician,
    chronology: Chronology,
    config: SchedulerConfig,
    clock: Option<DateTime<Utc>>,
    checksum: String,
}

impl Scheduler {
    pub fn new(
        catalog: FieldCatalog,
        tactician_config: TacticianConfig,
        config: SchedulerConfig,
    ) -> Result<Self> {
        config.validate()?;
        let tactician = Tactician::new(&catalog, tactician_config)?;
        let checksum = catalog_checksum(&catalog)?;
        info!(
            "Scheduler ready: {} fields, strategy '{}', catalog {}",
            catalog.len(),
            tactician.strategy().name(),
            &checksum[..12]
        );

        Ok(Self {
            catalog,
            tactician,
            chronology: Chronology::new(),
            config,
            clock: None,
            checksum,
        })
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn tactician(&self) -> &Tactician {
        &self.tactician
    }

    pub fn chronology(&self) -> &Chronology {
        &self.chronology
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Current simulated time; `None` before the first window opens.
    pub fn clock(&self) -> Option<DateTime<Utc>> {
        self.clock
    }

    pub fn catalog_checksum(&self) -> &str {
        &self.checksum
    }

    pub fn into_parts(self) -> (FieldCatalog, Chronology) {
        (self.catalog, self.chronology)
    }

    /// Schedule every window in order.
    pub fn run(&mut self, windows: &[ObservingWindow]) -> Result<RunSummary> {
        self.run_with(windows, |_| ControlFlow::Continue(()))
    }

    /// Like [`Self::run`], stopping once `limit` entries have been recorded.
    ///
    /// `Some(0)` records nothing and reports [`RunStatus::Cancelled`].
    pub fn run_limited(
        &mut self,
        windows: &[ObservingWindow],
        limit: Option<usize>,
    ) -> Result<RunSummary> {
        let Some(limit) = limit else {
            return self.run(windows);
        };
        if limit == 0 {
            info!("Entry limit is 0; nothing to schedule");
            return Ok(RunSummary {
                status: RunStatus::Cancelled,
                nights: Vec::new(),
                entries: 0,
                remaining: self.catalog.remaining_count(),
                catalog_checksum: self.checksum.clone(),
            });
        }

        let mut recorded = 0;
        self.run_with(windows, |_| {
            recorded += 1;
            if recorded >= limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
    }

    /// Like [`Self::run`], calling `on_entry` after each recorded decision.
    ///
    /// Returning [`ControlFlow::Break`] stops the run right after that entry.
    /// Catalog, chronology and clock stay consistent, so calling `run` again
    /// with the same windows resumes where it stopped.
    pub fn run_with<F>(&mut self, windows: &[ObservingWindow], mut on_entry: F) -> Result<RunSummary>
    where
        F: FnMut(&ChronologyEntry) -> ControlFlow<()>,
    {
        let mut nights = Vec::new();
        let mut recorded = 0;
        let mut status = RunStatus::Completed;

        'windows: for window in windows {
            if self.catalog.remaining_count() == 0 {
                status = RunStatus::CatalogExhausted;
                break;
            }

            let start = match self.clock {
                Some(clock) if clock > window.start() => clock,
                _ => window.start(),
            };
            if start >= window.end() {
                warn!(
                    "Skipping window {} - {}: it ends before the scheduler clock",
                    window.start(),
                    window.end()
                );
                continue;
            }
            self.clock = Some(start);

            let previous = self.chronology.last().map(ChronologyEntry::position);
            self.tactician.set_previous_position(previous);

            info!(
                "Opening {} night {} - {} with {} fields remaining",
                window.classification(),
                start,
                window.end(),
                self.catalog.remaining_count()
            );

            let mut night = NightSummary {
                start,
                end: window.end(),
                classification: window.classification(),
                entries: 0,
                idle_retries: 0,
            };

            let mut clock = start;
            while clock < window.end() {
                if self.catalog.remaining_count() == 0 {
                    status = RunStatus::CatalogExhausted;
                    break;
                }

                self.tactician.set_date(clock);
                let Some(selection) = self.tactician.select_field(&self.catalog) else {
                    debug!("No viable field at {}; retrying later", clock);
                    night.idle_retries += 1;
                    clock = advance_clock(clock, self.config.retry_interval)
                        .unwrap_or_else(|| window.end());
                    self.clock = Some(clock);
                    continue;
                };

                let field = self.catalog.get(selection.index).ok_or_else(|| {
                    SchedulerError::validation(format!(
                        "selected index {} outside catalog",
                        selection.index
                    ))
                })?;
                let moon_phase = self.tactician.moon_phase().unwrap_or_default();
                let entry = ChronologyEntry {
                    field_id: field.id,
                    time: clock,
                    ra: field.ra.value(),
                    dec: field.dec.value(),
                    filter: field.band,
                    tiling: field.tiling,
                    airmass: selection.metrics.airmass.value(),
                    hour_angle: selection.metrics.hour_angle.value(),
                    slew: selection.metrics.slew.value(),
                    moon_angle: selection.metrics.moon_angle.value(),
                    moon_phase,
                    exptime: field.exposure.value(),
                };

                let mut advance = field.exposure + self.config.overhead;
                if let Some(penalty) = &self.config.slew_penalty {
                    if selection.metrics.slew > penalty.threshold {
                        advance += penalty.delay;
                    }
                }
                let position = field.position();

                self.catalog.mark_observed(entry.field_id)?;
                self.chronology.push(entry.clone())?;
                self.tactician.set_previous_position(Some(position));

                clock = match advance_clock(clock, advance) {
                    Some(next) => next,
                    None => {
                        warn!(
                            "Field {} ({} s) runs past any representable time; closing the night",
                            entry.field_id,
                            advance.value()
                        );
                        window.end()
                    }
                };
                self.clock = Some(clock);
                night.entries += 1;
                recorded += 1;

                if on_entry(&entry).is_break() {
                    info!("Run cancelled after field {} at {}", entry.field_id, entry.time);
                    status = RunStatus::Cancelled;
                    nights.push(night);
                    break 'windows;
                }
            }

            info!(
                "Closing night {}: {} fields observed, {} idle retries",
                window.start().date_naive(),
                night.entries,
                night.idle_retries
            );
            nights.push(night);

            if status == RunStatus::CatalogExhausted {
                break;
            }
        }

        if status == RunStatus::Completed && self.catalog.remaining_count() == 0 {
            status = RunStatus::CatalogExhausted;
        }

        Ok(RunSummary {
            status,
            nights,
            entries: recorded,
            remaining: self.catalog.remaining_count(),
            catalog_checksum: self.checksum.clone(),
        })
    }
}
