//! Synthetic engine for bench runs without a bus transceiver.
//!
//! Sweeps a counter from 10 to 130 in steps of 2 and back to 10, and emits
//! real 127488/127489 payloads built from it:
//!
//! - coolant = counter °C
//! - speed = counter * 30 rpm
//! - hours = counter * 23.1 h

use crate::n2k::{
    EngineDynamic, EngineRapid, EngineStatus1, EngineStatus2, N2kMessage, PGN_ENGINE_DYNAMIC,
    PGN_ENGINE_RAPID,
};
use crate::units::{SECONDS_PER_HOUR, celsius_to_kelvin};

const COUNTER_START: u16 = 10;
const COUNTER_END: u16 = 130;
const COUNTER_STEP: u16 = 2;

/// Source address the demo engine transmits from.
pub const DEMO_SOURCE_ADDRESS: u8 = 0x17;
/// Default priority for engine PGNs.
const ENGINE_PRIORITY: u8 = 2;

/// Values the next frame will carry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DemoValues {
    pub coolant_c: f32,
    pub speed_rpm: f32,
    pub engine_hours: f32,
}

/// Counter-driven demo engine.
#[derive(Clone, Debug)]
pub struct DemoEngine {
    counter: u16,
    instance: u8,
    low_oil_pressure: bool,
}

impl Default for DemoEngine {
    fn default() -> Self { Self::new() }
}

impl DemoEngine {
    pub const fn new() -> Self {
        Self {
            counter: COUNTER_START,
            instance: 0,
            low_oil_pressure: false,
        }
    }

    /// Engine instance written into the payloads.
    pub const fn instance(&self) -> u8 { self.instance }

    pub fn set_instance(
        &mut self,
        instance: u8,
    ) {
        self.instance = instance;
    }

    pub const fn low_oil_pressure(&self) -> bool { self.low_oil_pressure }

    /// Set or clear the low oil pressure bit in discrete status 1.
    pub fn set_low_oil_pressure(
        &mut self,
        on: bool,
    ) {
        self.low_oil_pressure = on;
    }

    /// Values for the current counter position.
    pub fn values(&self) -> DemoValues {
        let i = f32::from(self.counter);
        DemoValues {
            coolant_c: i,
            speed_rpm: i * 30.0,
            engine_hours: i * 23.1,
        }
    }

    /// Build the rapid and dynamic messages for the current position, then
    /// advance.
    pub fn next_frame(&mut self) -> [N2kMessage; 2] {
        let v = self.values();
        let rapid = EngineRapid {
            instance: self.instance,
            speed_rpm: Some(v.speed_rpm),
            boost_pressure_pa: None,
            tilt_trim: None,
        };
        let status1 = if self.low_oil_pressure { EngineStatus1(1 << 2) } else { EngineStatus1(0) };
        let dynamic = EngineDynamic {
            instance: self.instance,
            oil_pressure_pa: Some(if self.low_oil_pressure { 50_000.0 } else { 350_000.0 }),
            coolant_temperature_k: Some(celsius_to_kelvin(v.coolant_c)),
            alternator_voltage: Some(14.2),
            engine_hours_s: Some((v.engine_hours * SECONDS_PER_HOUR) as u32),
            status1: Some(status1),
            status2: Some(EngineStatus2(0)),
            ..EngineDynamic::EMPTY
        };
        self.advance();
        [
            message(PGN_ENGINE_RAPID, &rapid.encode()),
            message(PGN_ENGINE_DYNAMIC, &dynamic.encode()),
        ]
    }

    fn advance(&mut self) {
        self.counter = if self.counter >= COUNTER_END { COUNTER_START } else { self.counter + COUNTER_STEP };
    }
}

fn message(
    pgn: u32,
    payload: &[u8],
) -> N2kMessage {
    match N2kMessage::new(pgn, ENGINE_PRIORITY, DEMO_SOURCE_ADDRESS, payload) {
        Some(m) => m,
        // Fixed-length layouts are far below MAX_PAYLOAD.
        None => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_sweeps_and_restarts() {
        let mut demo = DemoEngine::new();
        assert_eq!(demo.values().coolant_c, 10.0);
        for _ in 0..60 {
            demo.next_frame();
        }
        assert_eq!(demo.values().coolant_c, 130.0);
        demo.next_frame();
        assert_eq!(demo.values().coolant_c, 10.0);
    }

    #[test]
    fn test_frames_decode() {
        let mut demo = DemoEngine::new();
        for _ in 0..5 {
            demo.next_frame();
        }
        // counter = 20
        let [rapid, dynamic] = demo.next_frame();
        assert_eq!(rapid.pgn, PGN_ENGINE_RAPID);
        let r = EngineRapid::decode(rapid.payload()).unwrap();
        assert_eq!(r.speed_rpm, Some(600.0));

        let d = EngineDynamic::decode(dynamic.payload()).unwrap();
        let coolant = d.coolant_temperature_k.unwrap() - 273.15;
        assert!((coolant - 20.0).abs() < 0.02);
        assert_eq!(d.engine_hours_s, Some((20.0f32 * 23.1 * 3600.0) as u32));
        assert!(!d.status1.unwrap().low_oil_pressure());
    }

    #[test]
    fn test_instance_and_low_oil_carried() {
        let mut demo = DemoEngine::new();
        demo.set_instance(1);
        demo.set_low_oil_pressure(true);
        let [rapid, dynamic] = demo.next_frame();
        assert_eq!(EngineRapid::decode(rapid.payload()).unwrap().instance, 1);
        let d = EngineDynamic::decode(dynamic.payload()).unwrap();
        assert_eq!(d.instance, 1);
        assert!(d.status1.unwrap().low_oil_pressure());
    }
}
