//! Typed decoders for the four PGNs the gauge listens to.
//!
//! Each decoder validates the payload length up front, then reads the fixed
//! field layout. Scaled fields come out in SI units (Pa, K, V, s); conversion
//! to display units happens when the store applies them.
//!
//! The `encode` methods produce the same layouts. The demo bus source uses
//! them so the whole decode path runs without a transceiver.

use core::fmt;

use super::fields::{DecodeError, PayloadReader};

// =============================================================================
// Discrete Status Words
// =============================================================================

macro_rules! status_flags {
    ($(#[$meta:meta])* $name:ident($repr:ty) { $($(#[$fmeta:meta])* $flag:ident = $bit:expr,)* }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $name(pub $repr);

        impl $name {
            $(
                $(#[$fmeta])*
                #[inline]
                pub const fn $flag(self) -> bool { self.0 & (1 << $bit) != 0 }
            )*

            /// Names of all set flags, lowest bit first.
            pub fn active(self) -> impl Iterator<Item = &'static str> {
                const NAMES: &[(&str, u32)] = &[$((stringify!($flag), $bit),)*];
                NAMES
                    .iter()
                    .filter(move |(_, bit)| self.0 & (1 << *bit) != 0)
                    .map(|(name, _)| *name)
            }
        }
    };
}

status_flags! {
    /// Engine discrete status 1.
    EngineStatus1(u16) {
        /// Check engine lamp.
        check_engine = 0,
        /// Over temperature.
        over_temperature = 1,
        /// Low oil pressure.
        low_oil_pressure = 2,
        /// Low oil level.
        low_oil_level = 3,
        /// Low fuel pressure.
        low_fuel_pressure = 4,
        /// Low system voltage.
        low_system_voltage = 5,
        /// Low coolant level.
        low_coolant_level = 6,
        /// Raw water flow.
        water_flow = 7,
        /// Water in fuel.
        water_in_fuel = 8,
        /// Charge indicator.
        charge_indicator = 9,
        /// Preheat indicator.
        preheat_indicator = 10,
        /// High boost pressure.
        high_boost_pressure = 11,
        /// Rev limit exceeded.
        rev_limit_exceeded = 12,
        /// EGR system.
        egr_system = 13,
        /// Throttle position sensor.
        throttle_position_sensor = 14,
        /// Emergency stop mode.
        emergency_stop_mode = 15,
    }
}

status_flags! {
    /// Engine discrete status 2.
    EngineStatus2(u16) {
        /// Warning level 1.
        warning_level_1 = 0,
        /// Warning level 2.
        warning_level_2 = 1,
        /// Power reduction.
        power_reduction = 2,
        /// Maintenance needed.
        maintenance_needed = 3,
        /// Engine communication error.
        engine_comm_error = 4,
        /// Sub or secondary throttle.
        sub_or_secondary_throttle = 5,
        /// Neutral start protect.
        neutral_start_protect = 6,
        /// Engine shutting down.
        engine_shutting_down = 7,
    }
}

// =============================================================================
// 126992 System Time
// =============================================================================

/// Origin of a System Time message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeSource {
    Gps,
    Glonass,
    RadioStation,
    LocalCesiumClock,
    LocalRubidiumClock,
    LocalCrystalClock,
    Other(u8),
}

impl From<u8> for TimeSource {
    fn from(raw: u8) -> Self {
        match raw & 0x0F {
            0 => Self::Gps,
            1 => Self::Glonass,
            2 => Self::RadioStation,
            3 => Self::LocalCesiumClock,
            4 => Self::LocalRubidiumClock,
            5 => Self::LocalCrystalClock,
            other => Self::Other(other),
        }
    }
}

/// Ticks per second of the System Time time-of-day field.
pub const TIME_TICKS_PER_SECOND: u32 = 10_000;

const SECONDS_PER_DAY: u32 = 86_400;

/// PGN 126992: UTC date and time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemTime {
    pub sid: u8,
    pub source: TimeSource,
    /// Days since 1970-01-01.
    pub days_since_epoch: u16,
    /// Time since midnight in 0.0001 s ticks.
    pub time_ticks: u32,
}

impl SystemTime {
    pub const LEN: usize = 8;

    /// Decode, rejecting a zero/unavailable date or a time outside one day.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut r = PayloadReader::new(data, Self::LEN)?;
        let sid = r.u8();
        let source = TimeSource::from(r.u8());
        let days_since_epoch = r
            .u16_opt()
            .filter(|&d| d > 0)
            .ok_or(DecodeError::OutOfRange("system date"))?;
        let time_ticks = r
            .u32_opt()
            .filter(|&t| t < SECONDS_PER_DAY * TIME_TICKS_PER_SECOND)
            .ok_or(DecodeError::OutOfRange("system time"))?;
        Ok(Self {
            sid,
            source,
            days_since_epoch,
            time_ticks,
        })
    }

    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut out = [0xFF; Self::LEN];
        out[0] = self.sid;
        out[1] = 0xF0
            | match self.source {
                TimeSource::Gps => 0,
                TimeSource::Glonass => 1,
                TimeSource::RadioStation => 2,
                TimeSource::LocalCesiumClock => 3,
                TimeSource::LocalRubidiumClock => 4,
                TimeSource::LocalCrystalClock => 5,
                TimeSource::Other(raw) => raw & 0x0F,
            };
        out[2..4].copy_from_slice(&self.days_since_epoch.to_le_bytes());
        out[4..8].copy_from_slice(&self.time_ticks.to_le_bytes());
        out
    }

    /// Time of day as (hours, minutes, seconds).
    pub const fn hms(&self) -> (u8, u8, u8) {
        let secs = self.time_ticks / TIME_TICKS_PER_SECOND;
        ((secs / 3600) as u8, ((secs / 60) % 60) as u8, (secs % 60) as u8)
    }
}

impl fmt::Display for SystemTime {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let (h, m, s) = self.hms();
        write!(f, "day {} {h:02}:{m:02}:{s:02}", self.days_since_epoch)
    }
}

// =============================================================================
// 127488 Engine Parameters, Rapid Update
// =============================================================================

/// PGN 127488: fast-rate engine speed and boost.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineRapid {
    pub instance: u8,
    /// Engine speed in rpm.
    pub speed_rpm: Option<f32>,
    /// Boost pressure in Pa.
    pub boost_pressure_pa: Option<f32>,
    /// Tilt/trim in percent.
    pub tilt_trim: Option<i8>,
}

impl EngineRapid {
    pub const LEN: usize = 8;

    const SPEED_RES: f32 = 0.25;
    const BOOST_RES: f32 = 100.0;

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut r = PayloadReader::new(data, Self::LEN)?;
        Ok(Self {
            instance: r.u8(),
            speed_rpm: r.u16_scaled(Self::SPEED_RES),
            boost_pressure_pa: r.u16_scaled(Self::BOOST_RES),
            tilt_trim: r.i8_opt(),
        })
    }

    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut out = [0xFF; Self::LEN];
        out[0] = self.instance;
        out[1..3].copy_from_slice(&raw_u16(self.speed_rpm, Self::SPEED_RES).to_le_bytes());
        out[3..5].copy_from_slice(&raw_u16(self.boost_pressure_pa, Self::BOOST_RES).to_le_bytes());
        out[5] = self.tilt_trim.unwrap_or(i8::MAX) as u8;
        out
    }
}

impl fmt::Display for EngineRapid {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "engine {} rapid: ", self.instance)?;
        match self.speed_rpm {
            Some(rpm) => write!(f, "{rpm:.0} rpm"),
            None => f.write_str("speed n/a"),
        }
    }
}

// =============================================================================
// 127489 Engine Parameters, Dynamic
// =============================================================================

/// PGN 127489: slow-rate engine temperatures, pressures and status.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineDynamic {
    pub instance: u8,
    /// Oil pressure in Pa.
    pub oil_pressure_pa: Option<f32>,
    /// Oil temperature in K.
    pub oil_temperature_k: Option<f32>,
    /// Coolant temperature in K.
    pub coolant_temperature_k: Option<f32>,
    /// Alternator potential in V.
    pub alternator_voltage: Option<f32>,
    /// Fuel rate in L/h.
    pub fuel_rate_lph: Option<f32>,
    /// Total engine hours in seconds.
    pub engine_hours_s: Option<u32>,
    /// Coolant pressure in Pa.
    pub coolant_pressure_pa: Option<f32>,
    /// Fuel pressure in Pa.
    pub fuel_pressure_pa: Option<f32>,
    pub status1: Option<EngineStatus1>,
    pub status2: Option<EngineStatus2>,
    /// Percent engine load.
    pub load_percent: Option<i8>,
    /// Percent engine torque.
    pub torque_percent: Option<i8>,
}

impl EngineDynamic {
    pub const LEN: usize = 26;

    const OIL_PRESSURE_RES: f32 = 100.0;
    const OIL_TEMP_RES: f32 = 0.1;
    const COOLANT_TEMP_RES: f32 = 0.01;
    const VOLTAGE_RES: f32 = 0.01;
    const FUEL_RATE_RES: f32 = 0.1;
    const COOLANT_PRESSURE_RES: f32 = 100.0;
    const FUEL_PRESSURE_RES: f32 = 1000.0;

    /// A message with every field "not available".
    pub const EMPTY: Self = Self {
        instance: 0,
        oil_pressure_pa: None,
        oil_temperature_k: None,
        coolant_temperature_k: None,
        alternator_voltage: None,
        fuel_rate_lph: None,
        engine_hours_s: None,
        coolant_pressure_pa: None,
        fuel_pressure_pa: None,
        status1: None,
        status2: None,
        load_percent: None,
        torque_percent: None,
    };

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut r = PayloadReader::new(data, Self::LEN)?;
        let instance = r.u8();
        let oil_pressure_pa = r.u16_scaled(Self::OIL_PRESSURE_RES);
        let oil_temperature_k = r.u16_scaled(Self::OIL_TEMP_RES);
        let coolant_temperature_k = r.u16_scaled(Self::COOLANT_TEMP_RES);
        let alternator_voltage = r.i16_scaled(Self::VOLTAGE_RES);
        let fuel_rate_lph = r.i16_scaled(Self::FUEL_RATE_RES);
        let engine_hours_s = r.u32_opt();
        let coolant_pressure_pa = r.u16_scaled(Self::COOLANT_PRESSURE_RES);
        let fuel_pressure_pa = r.u16_scaled(Self::FUEL_PRESSURE_RES);
        r.skip(1);
        let status1 = r.u16_opt().map(EngineStatus1);
        let status2 = r.u16_opt().map(EngineStatus2);
        let load_percent = r.i8_opt();
        let torque_percent = r.i8_opt();
        Ok(Self {
            instance,
            oil_pressure_pa,
            oil_temperature_k,
            coolant_temperature_k,
            alternator_voltage,
            fuel_rate_lph,
            engine_hours_s,
            coolant_pressure_pa,
            fuel_pressure_pa,
            status1,
            status2,
            load_percent,
            torque_percent,
        })
    }

    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut out = [0xFF; Self::LEN];
        out[0] = self.instance;
        out[1..3].copy_from_slice(&raw_u16(self.oil_pressure_pa, Self::OIL_PRESSURE_RES).to_le_bytes());
        out[3..5].copy_from_slice(&raw_u16(self.oil_temperature_k, Self::OIL_TEMP_RES).to_le_bytes());
        out[5..7].copy_from_slice(&raw_u16(self.coolant_temperature_k, Self::COOLANT_TEMP_RES).to_le_bytes());
        out[7..9].copy_from_slice(&raw_i16(self.alternator_voltage, Self::VOLTAGE_RES).to_le_bytes());
        out[9..11].copy_from_slice(&raw_i16(self.fuel_rate_lph, Self::FUEL_RATE_RES).to_le_bytes());
        out[11..15].copy_from_slice(&self.engine_hours_s.unwrap_or(u32::MAX).to_le_bytes());
        out[15..17].copy_from_slice(&raw_u16(self.coolant_pressure_pa, Self::COOLANT_PRESSURE_RES).to_le_bytes());
        out[17..19].copy_from_slice(&raw_u16(self.fuel_pressure_pa, Self::FUEL_PRESSURE_RES).to_le_bytes());
        out[20..22].copy_from_slice(&self.status1.map_or(u16::MAX, |s| s.0).to_le_bytes());
        out[22..24].copy_from_slice(&self.status2.map_or(u16::MAX, |s| s.0).to_le_bytes());
        out[24] = self.load_percent.unwrap_or(i8::MAX) as u8;
        out[25] = self.torque_percent.unwrap_or(i8::MAX) as u8;
        out
    }
}

impl fmt::Display for EngineDynamic {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "engine {} dynamic:", self.instance)?;
        if let Some(k) = self.coolant_temperature_k {
            write!(f, " coolant {:.1}C", crate::units::kelvin_to_celsius(k))?;
        }
        if let Some(pa) = self.oil_pressure_pa {
            write!(f, " oil {:.0}mbar", crate::units::pascal_to_millibar(pa))?;
        }
        if let Some(v) = self.alternator_voltage {
            write!(f, " alt {v:.2}V")?;
        }
        if let Some(s) = self.engine_hours_s {
            write!(f, " hours {:.1}", crate::units::seconds_to_hours(s as f32))?;
        }
        Ok(())
    }
}

// =============================================================================
// 127493 Transmission Parameters, Dynamic
// =============================================================================

/// Transmission gear selector position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gear {
    Forward,
    Neutral,
    Reverse,
    Unknown,
}

impl From<u8> for Gear {
    fn from(raw: u8) -> Self {
        match raw & 0x03 {
            0 => Self::Forward,
            1 => Self::Neutral,
            2 => Self::Reverse,
            _ => Self::Unknown,
        }
    }
}

/// PGN 127493: gear, transmission oil pressure and temperature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transmission {
    pub instance: u8,
    pub gear: Gear,
    /// Oil pressure in Pa.
    pub oil_pressure_pa: Option<f32>,
    /// Oil temperature in K.
    pub oil_temperature_k: Option<f32>,
    pub discrete_status: Option<u8>,
}

impl Transmission {
    pub const LEN: usize = 8;

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut r = PayloadReader::new(data, Self::LEN)?;
        Ok(Self {
            instance: r.u8(),
            gear: Gear::from(r.u8()),
            oil_pressure_pa: r.u16_scaled(100.0),
            oil_temperature_k: r.u16_scaled(0.1),
            discrete_status: r.u8_opt(),
        })
    }
}

impl fmt::Display for Transmission {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "transmission {}: {:?}", self.instance, self.gear)?;
        if let Some(k) = self.oil_temperature_k {
            write!(f, " oil {:.1}C", crate::units::kelvin_to_celsius(k))?;
        }
        Ok(())
    }
}

// =============================================================================
// Encoding Helpers
// =============================================================================

fn raw_u16(
    value: Option<f32>,
    resolution: f32,
) -> u16 {
    match value {
        // Clamp below the sentinel so a real value never encodes as "n/a".
        Some(v) => micromath::F32(v / resolution).round().0.clamp(0.0, f32::from(u16::MAX - 1)) as u16,
        None => u16::MAX,
    }
}

fn raw_i16(
    value: Option<f32>,
    resolution: f32,
) -> i16 {
    match value {
        Some(v) => micromath::F32(v / resolution)
            .round()
            .0
            .clamp(f32::from(i16::MIN), f32::from(i16::MAX - 1)) as i16,
        None => i16::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_rapid_decode() {
        // instance 0, 3456 rpm, boost n/a, tilt n/a
        let speed = (3456u16 * 4).to_le_bytes();
        let data = [0, speed[0], speed[1], 0xFF, 0xFF, 0x7F, 0xFF, 0xFF];
        let msg = EngineRapid::decode(&data).unwrap();
        assert_eq!(msg.instance, 0);
        assert_eq!(msg.speed_rpm, Some(3456.0));
        assert_eq!(msg.boost_pressure_pa, None);
        assert_eq!(msg.tilt_trim, None);
    }

    #[test]
    fn test_engine_rapid_truncated() {
        assert_eq!(
            EngineRapid::decode(&[0, 1, 2]),
            Err(DecodeError::Truncated { needed: 8, got: 3 })
        );
    }

    #[test]
    fn test_engine_dynamic_layout() {
        let mut data = [0xFFu8; EngineDynamic::LEN];
        data[0] = 1;
        // oil pressure 350 kPa -> 3500 * 100 Pa
        data[1..3].copy_from_slice(&3500u16.to_le_bytes());
        // coolant 85 C = 358.15 K -> 35815 * 0.01 K
        data[5..7].copy_from_slice(&35815u16.to_le_bytes());
        // 13.8 V
        data[7..9].copy_from_slice(&1380i16.to_le_bytes());
        // signed fields are n/a at max-positive, not all-ones
        data[9..11].copy_from_slice(&i16::MAX.to_le_bytes());
        // 2.5 h
        data[11..15].copy_from_slice(&9000u32.to_le_bytes());
        // low oil pressure + check engine
        data[20..22].copy_from_slice(&0b0000_0101u16.to_le_bytes());
        data[22..24].copy_from_slice(&0u16.to_le_bytes());
        data[24] = i8::MAX as u8;
        data[25] = i8::MAX as u8;

        let msg = EngineDynamic::decode(&data).unwrap();
        assert_eq!(msg.instance, 1);
        assert_eq!(msg.oil_pressure_pa, Some(350_000.0));
        assert!((msg.coolant_temperature_k.unwrap() - 358.15).abs() < 0.01);
        assert!((msg.alternator_voltage.unwrap() - 13.8).abs() < 0.001);
        assert_eq!(msg.engine_hours_s, Some(9000));
        assert_eq!(msg.oil_temperature_k, None);
        assert_eq!(msg.fuel_rate_lph, None);
        let status1 = msg.status1.unwrap();
        assert!(status1.check_engine());
        assert!(status1.low_oil_pressure());
        assert!(!status1.over_temperature());
        assert_eq!(msg.status2, Some(EngineStatus2(0)));
        assert_eq!(msg.load_percent, None);
        assert_eq!(msg.torque_percent, None);
    }

    #[test]
    fn test_engine_dynamic_all_ones_fuel_rate_is_negative() {
        let mut data = EngineDynamic::EMPTY.encode();
        data[9..11].copy_from_slice(&[0xFF, 0xFF]);
        let msg = EngineDynamic::decode(&data).unwrap();
        assert!((msg.fuel_rate_lph.unwrap() + 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_engine_dynamic_encode_matches_decode_layout() {
        let msg = EngineDynamic {
            instance: 0,
            coolant_temperature_k: Some(crate::units::celsius_to_kelvin(90.0)),
            engine_hours_s: Some(3600 * 120),
            status1: Some(EngineStatus1(1 << 2)),
            status2: Some(EngineStatus2(0)),
            ..EngineDynamic::EMPTY
        };
        let decoded = EngineDynamic::decode(&msg.encode()).unwrap();
        assert_eq!(decoded.engine_hours_s, Some(432_000));
        assert!(decoded.status1.unwrap().low_oil_pressure());
        assert!((decoded.coolant_temperature_k.unwrap() - 363.15).abs() < 0.01);
        assert_eq!(decoded.oil_pressure_pa, None);
    }

    #[test]
    fn test_status_active_names() {
        let status = EngineStatus1((1 << 1) | (1 << 15));
        let mut names = status.active();
        assert_eq!(names.next(), Some("over_temperature"));
        assert_eq!(names.next(), Some("emergency_stop_mode"));
        assert_eq!(names.next(), None);
        assert_eq!(EngineStatus2(1 << 7).active().next(), Some("engine_shutting_down"));
    }

    #[test]
    fn test_system_time_valid() {
        // 2024-01-01 = day 19723, 12:34:56
        let ticks = (12 * 3600 + 34 * 60 + 56) * TIME_TICKS_PER_SECOND;
        let mut data = [0u8; 8];
        data[0] = 9;
        data[1] = 0xF0;
        data[2..4].copy_from_slice(&19723u16.to_le_bytes());
        data[4..8].copy_from_slice(&ticks.to_le_bytes());
        let time = SystemTime::decode(&data).unwrap();
        assert_eq!(time.sid, 9);
        assert_eq!(time.source, TimeSource::Gps);
        assert_eq!(time.days_since_epoch, 19723);
        assert_eq!(time.hms(), (12, 34, 56));
    }

    #[test]
    fn test_system_time_rejects_invalid() {
        let valid = SystemTime {
            sid: 0,
            source: TimeSource::LocalCrystalClock,
            days_since_epoch: 100,
            time_ticks: 0,
        };
        assert!(SystemTime::decode(&valid.encode()).is_ok());

        let zero_date = SystemTime { days_since_epoch: 0, ..valid };
        assert_eq!(
            SystemTime::decode(&zero_date.encode()),
            Err(DecodeError::OutOfRange("system date"))
        );

        let past_midnight = SystemTime {
            time_ticks: 86_400 * TIME_TICKS_PER_SECOND,
            ..valid
        };
        assert_eq!(
            SystemTime::decode(&past_midnight.encode()),
            Err(DecodeError::OutOfRange("system time"))
        );
    }

    #[test]
    fn test_transmission_gear_bits() {
        let data = [0, 0b1111_1110, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let msg = Transmission::decode(&data).unwrap();
        assert_eq!(msg.gear, Gear::Reverse);
        assert_eq!(msg.oil_pressure_pa, None);
        assert_eq!(msg.discrete_status, None);
    }

    #[test]
    fn test_encode_never_emits_sentinel_for_values() {
        let msg = EngineRapid {
            instance: 0,
            speed_rpm: Some(1.0e9),
            boost_pressure_pa: None,
            tilt_trim: None,
        };
        let decoded = EngineRapid::decode(&msg.encode()).unwrap();
        assert_eq!(decoded.speed_rpm, Some(f32::from(u16::MAX - 1) * 0.25));
    }
}
