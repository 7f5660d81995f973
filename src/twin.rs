//! Digital twin session state
//!
//! Owns every parameter, the fault registry, the simulation clock and the
//! repeating-task scheduler, and keeps the derived layout and sun position in
//! step with them. Each input event or clock tick recomputes exactly the
//! derived values whose inputs changed, before returning.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use std::time::Duration;

use crate::clock::{DEFAULT_RATE, SimulationClock, TICK_INTERVAL};
use crate::error::Result;
use crate::faults::{FaultRegistry, pulse_intensity};
use crate::layout::{FrameSpec, Layout, PanelSpec, compute_layout};
use crate::scene::Scene;
use crate::scheduler::{Concern, Scheduler};
use crate::sun::{SunCalculator, SunPosition};
use crate::time::parse_datetime_local;

/// Refresh cadence of the fault highlight
pub const PULSE_INTERVAL: Duration = Duration::from_millis(100);

// ===================== PARAMETERS =====================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TwinParams {
    pub frame: FrameSpec,
    pub panel: PanelSpec,
    pub sun_intensity: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for TwinParams {
    fn default() -> Self {
        Self {
            frame: FrameSpec::default(),
            panel: PanelSpec::default(),
            sun_intensity: 1.0,
            latitude: 15.23,
            longitude: 73.52,
        }
    }
}

/// Editable numeric fields of the parameter sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    FrameLength,
    FrameDepth,
    FrameHeight,
    PanelLength,
    PanelDepth,
    PanelHeight,
    HeightFromGround,
    SunIntensity,
    Latitude,
    Longitude,
}

impl Param {
    pub const ALL: [Param; 10] = [
        Param::FrameLength,
        Param::FrameDepth,
        Param::FrameHeight,
        Param::PanelLength,
        Param::PanelDepth,
        Param::PanelHeight,
        Param::HeightFromGround,
        Param::SunIntensity,
        Param::Latitude,
        Param::Longitude,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Param::FrameLength => "Frame Length",
            Param::FrameDepth => "Frame Width",
            Param::FrameHeight => "Frame Height",
            Param::PanelLength => "Panel Length",
            Param::PanelDepth => "Panel Width",
            Param::PanelHeight => "Panel Height",
            Param::HeightFromGround => "Height From Ground",
            Param::SunIntensity => "Sun Intensity",
            Param::Latitude => "Latitude",
            Param::Longitude => "Longitude",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Param::SunIntensity => "lux",
            Param::Latitude | Param::Longitude => "°",
            _ => "m",
        }
    }

    fn affects_layout(self) -> bool {
        !matches!(self, Param::SunIntensity | Param::Latitude | Param::Longitude)
    }

    fn affects_sun(self) -> bool {
        matches!(self, Param::Latitude | Param::Longitude)
    }
}

impl TwinParams {
    pub fn get(&self, param: Param) -> f64 {
        match param {
            Param::FrameLength => self.frame.length,
            Param::FrameDepth => self.frame.depth,
            Param::FrameHeight => self.frame.height,
            Param::PanelLength => self.panel.length,
            Param::PanelDepth => self.panel.depth,
            Param::PanelHeight => self.panel.height,
            Param::HeightFromGround => self.frame.height_from_ground,
            Param::SunIntensity => self.sun_intensity,
            Param::Latitude => self.latitude,
            Param::Longitude => self.longitude,
        }
    }

    fn slot(&mut self, param: Param) -> &mut f64 {
        match param {
            Param::FrameLength => &mut self.frame.length,
            Param::FrameDepth => &mut self.frame.depth,
            Param::FrameHeight => &mut self.frame.height,
            Param::PanelLength => &mut self.panel.length,
            Param::PanelDepth => &mut self.panel.depth,
            Param::PanelHeight => &mut self.panel.height,
            Param::HeightFromGround => &mut self.frame.height_from_ground,
            Param::SunIntensity => &mut self.sun_intensity,
            Param::Latitude => &mut self.latitude,
            Param::Longitude => &mut self.longitude,
        }
    }
}

// ===================== INPUT COERCION =====================

/// Numeric text input, leniently: the longest leading number is used and
/// anything unparseable or non-finite becomes 0.
pub fn coerce_number(raw: &str) -> f64 {
    let s = raw.trim();
    let parsed = s[..numeric_prefix_len(s)].parse::<f64>().ok();

    match parsed {
        Some(v) if v.is_finite() => v,
        _ => {
            if !s.is_empty() {
                log::warn!("non-numeric input '{}' coerced to 0", raw);
            }
            0.0
        }
    }
}

/// Byte length of the leading `[+-]digits[.digits][e[+-]digits]` run.
fn numeric_prefix_len(s: &str) -> usize {
    let b = s.as_bytes();
    let digits = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    i = digits(i);
    if b.get(i) == Some(&b'.') {
        i = digits(i + 1);
    }
    if matches!(b.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(b.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let end = digits(j);
        // an exponent needs at least one digit
        if end > j {
            i = end;
        }
    }
    i
}

// ===================== TWIN =====================

/// What happened during one call to [`Twin::advance_to`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Advance {
    pub simulation_ticks: u32,
    pub pulse_updates: u32,
}

pub struct Twin {
    params: TwinParams,
    registry: FaultRegistry,
    calculator: SunCalculator,
    clock: SimulationClock,
    scheduler: Scheduler,
    timezone: Tz,
    pulse: f64,
    layout: Layout,
    sun: SunPosition,
}

impl Twin {
    /// Build a session. The fault pulse is armed straight away when the
    /// registry holds any fault.
    pub fn new(
        params: TwinParams,
        registry: FaultRegistry,
        calculator: SunCalculator,
        start: DateTime<Tz>,
    ) -> Self {
        let layout = compute_layout(&params.frame, &params.panel, registry.len(), &registry);
        let sun = calculator.position(start, params.latitude, params.longitude);
        let mut scheduler = Scheduler::new();
        if !registry.faulted_indices().is_empty() {
            scheduler.arm(Concern::FaultPulse, PULSE_INTERVAL, Duration::ZERO);
        }

        Self {
            params,
            registry,
            calculator,
            clock: SimulationClock::new(start),
            scheduler,
            timezone: start.timezone(),
            pulse: 1.0,
            layout,
            sun,
        }
    }

    pub fn params(&self) -> &TwinParams {
        &self.params
    }

    pub fn registry(&self) -> &FaultRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn sun(&self) -> &SunPosition {
        &self.sun
    }

    pub fn pulse(&self) -> f64 {
        self.pulse
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn model_name(&self) -> &'static str {
        self.calculator.model_name()
    }

    fn recompute_layout(&mut self) {
        self.layout = compute_layout(
            &self.params.frame,
            &self.params.panel,
            self.registry.len(),
            &self.registry,
        );
    }

    fn recompute_sun(&mut self) {
        self.sun = self.calculator.position(
            self.clock.time(),
            self.params.latitude,
            self.params.longitude,
        );
        log::trace!("sun at ({:.1}, {:.1}, {:.1})", self.sun.x, self.sun.y, self.sun.z);
    }

    // ----- parameter edits -----

    pub fn set_param(&mut self, param: Param, value: f64) {
        let value = if value.is_finite() { value } else { 0.0 };
        *self.params.slot(param) = value;
        log::debug!("{} set to {}", param.label(), value);
        if param.affects_layout() {
            self.recompute_layout();
        }
        if param.affects_sun() {
            self.recompute_sun();
        }
    }

    /// Text typed into a numeric field.
    pub fn input_param(&mut self, param: Param, raw: &str) {
        self.set_param(param, coerce_number(raw));
    }

    pub fn set_time(&mut self, t: DateTime<Tz>) {
        self.clock.set_time(t.with_timezone(&self.timezone));
        self.recompute_sun();
    }

    /// Value of the date-time field. An unparseable value leaves the
    /// simulated time untouched.
    pub fn input_datetime(&mut self, raw: &str) -> Result<()> {
        let t = parse_datetime_local(raw, self.timezone)?;
        self.set_time(t);
        Ok(())
    }

    pub fn set_rate(&mut self, rate: u32) {
        self.clock.set_rate(rate);
    }

    /// Slider position as text; rounded and clamped to the slider range.
    pub fn input_rate(&mut self, raw: &str) {
        let v = coerce_number(raw).round();
        let rate = if v <= 0.0 { 0 } else if v >= u32::MAX as f64 { u32::MAX } else { v as u32 };
        self.clock.set_rate(rate);
    }

    // ----- simulation control -----

    pub fn start_simulation(&mut self, now: Duration) {
        self.clock.start();
        self.scheduler.arm(Concern::SimulationTick, TICK_INTERVAL, now);
    }

    /// Freeze simulated time and disarm the tick task.
    pub fn pause_simulation(&mut self) {
        self.clock.pause();
        self.scheduler.disarm(Concern::SimulationTick);
    }

    /// Start/pause button. Returns whether the simulation is now running.
    pub fn toggle_simulation(&mut self, now: Duration) -> bool {
        if self.clock.is_running() {
            self.pause_simulation();
        } else {
            self.start_simulation(now);
        }
        self.clock.is_running()
    }

    /// Restore every parameter to its default and pause the simulation.
    /// Simulated time is kept.
    pub fn reset(&mut self) {
        self.params = TwinParams::default();
        self.pause_simulation();
        self.clock.set_rate(DEFAULT_RATE);
        self.recompute_layout();
        self.recompute_sun();
        log::info!("parameters reset to defaults");
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Run every scheduled task due at `now` (session time). Each simulation
    /// tick advances the clock and then recomputes the sun; each pulse update
    /// samples `wall_ms`.
    pub fn advance_to(&mut self, now: Duration, wall_ms: f64) -> Advance {
        let mut report = Advance::default();
        for concern in self.scheduler.due(now) {
            match concern {
                Concern::SimulationTick => {
                    if self.clock.tick().is_some() {
                        self.recompute_sun();
                        report.simulation_ticks += 1;
                    } else if !self.clock.is_running() {
                        // the clock stopped itself at the end of the calendar
                        self.scheduler.disarm(Concern::SimulationTick);
                    }
                }
                Concern::FaultPulse => {
                    self.pulse = pulse_intensity(wall_ms);
                    report.pulse_updates += 1;
                }
            }
        }
        report
    }

    pub fn scene(&self) -> Scene {
        Scene::compose(&self.layout, &self.sun, self.params.sun_intensity, self.pulse)
    }
}

// ===================== TESTS =====================
