//! Shared "last known good" telemetry record.
//!
//! Written by the decode handlers on one core, read by the render pipeline on
//! the other. Each message group is applied inside one critical section and
//! the renderer copies the whole record out under the same lock, so a frame
//! never sees half of one message's update. Fields a message reports as "not
//! available" keep their previous value.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::n2k::{EngineDynamic, EngineRapid, EngineStatus1, EngineStatus2};
use crate::units::{kelvin_to_celsius, pascal_to_millibar, seconds_to_hours};

/// Display-unit copy of the current readings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TelemetrySnapshot {
    /// Engine speed (rpm).
    pub engine_speed_rpm: f32,
    /// Total engine run time (h).
    pub engine_hours: f32,
    /// Coolant temperature (°C).
    pub coolant_temp_c: f32,
    /// Oil pressure (mbar).
    pub oil_pressure_mbar: f32,
    /// Alternator potential (V).
    pub alternator_voltage: f32,
    /// Mirrors `status1.low_oil_pressure()`.
    pub low_oil_pressure_warning: bool,
    pub status1: EngineStatus1,
    pub status2: EngineStatus2,
}

impl TelemetrySnapshot {
    /// Startup state: everything zeroed, no warnings.
    pub const DEFAULT: Self = Self {
        engine_speed_rpm: 0.0,
        engine_hours: 0.0,
        coolant_temp_c: 0.0,
        oil_pressure_mbar: 0.0,
        alternator_voltage: 0.0,
        low_oil_pressure_warning: false,
        status1: EngineStatus1(0),
        status2: EngineStatus2(0),
    };

    fn with_engine_rapid(
        mut self,
        update: &EngineRapid,
    ) -> Self {
        if let Some(rpm) = update.speed_rpm {
            self.engine_speed_rpm = rpm;
        }
        self
    }

    fn with_engine_dynamic(
        mut self,
        update: &EngineDynamic,
    ) -> Self {
        if let Some(s) = update.engine_hours_s {
            self.engine_hours = seconds_to_hours(s as f32);
        }
        if let Some(pa) = update.oil_pressure_pa {
            self.oil_pressure_mbar = pascal_to_millibar(pa);
        }
        if let Some(k) = update.coolant_temperature_k {
            self.coolant_temp_c = kelvin_to_celsius(k);
        }
        if let Some(v) = update.alternator_voltage {
            self.alternator_voltage = v;
        }
        if let Some(status1) = update.status1 {
            self.status1 = status1;
            self.low_oil_pressure_warning = status1.low_oil_pressure();
        }
        if let Some(status2) = update.status2 {
            self.status2 = status2;
        }
        self
    }
}

impl Default for TelemetrySnapshot {
    fn default() -> Self { Self::DEFAULT }
}

/// Per-message-group write operations used by the decode handlers.
pub trait TelemetrySink {
    /// Apply the fields carried by Engine Parameters, Rapid.
    fn apply_engine_rapid(
        &self,
        update: &EngineRapid,
    );

    /// Apply the fields carried by Engine Parameters, Dynamic.
    fn apply_engine_dynamic(
        &self,
        update: &EngineDynamic,
    );
}

/// Mutex-guarded telemetry record.
///
/// `M` is `CriticalSectionRawMutex` on the firmware (shared across cores) and
/// in host tests.
pub struct TelemetryStore<M: RawMutex> {
    inner: Mutex<M, Cell<TelemetrySnapshot>>,
}

impl<M: RawMutex> TelemetryStore<M> {
    /// Store holding [`TelemetrySnapshot::DEFAULT`]. Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::const_new(M::INIT, Cell::new(TelemetrySnapshot::DEFAULT)),
        }
    }

    /// Copy of the current record.
    pub fn snapshot(&self) -> TelemetrySnapshot { self.inner.lock(Cell::get) }

    fn update(
        &self,
        f: impl FnOnce(TelemetrySnapshot) -> TelemetrySnapshot,
    ) {
        self.inner.lock(|cell| cell.set(f(cell.get())));
    }
}

impl<M: RawMutex> Default for TelemetryStore<M> {
    fn default() -> Self { Self::new() }
}

impl<M: RawMutex> TelemetrySink for TelemetryStore<M> {
    fn apply_engine_rapid(
        &self,
        update: &EngineRapid,
    ) {
        self.update(|s| s.with_engine_rapid(update));
    }

    fn apply_engine_dynamic(
        &self,
        update: &EngineDynamic,
    ) {
        self.update(|s| s.with_engine_dynamic(update));
    }
}
