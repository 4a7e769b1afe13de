//! Async GC9A01 driver for the 240x240 round panel.
//!
//! The gauge composes whole frames in RAM, so the driver only needs three
//! things: the power-on register sequence, a full-screen window, and a
//! DMA transfer of a finished frame.
//!
//! Pin mapping:
//! - DC: GPIO8
//! - CS: GPIO9
//! - CLK: GPIO10 (SPI1 SCK)
//! - MOSI: GPIO11 (SPI1 TX)
//! - RST: GPIO12
//! - Backlight: GPIO25 (PWM slice 4, channel B)

use embassy_rp::gpio::Output;
use embassy_rp::spi::{Async, Config as SpiConfig, Error as SpiError, Spi};
use embassy_time::Timer;
use gauge_common::config::{SCREEN_HEIGHT, SCREEN_WIDTH};

// GC9A01 commands
const SLPOUT: u8 = 0x11;
const INVON: u8 = 0x21;
const DISPON: u8 = 0x29;
const CASET: u8 = 0x2A;
const RASET: u8 = 0x2B;
const RAMWR: u8 = 0x2C;
const TEON: u8 = 0x35;
const MADCTL: u8 = 0x36;
const COLMOD: u8 = 0x3A;

// MADCTL flags
const MADCTL_BGR: u8 = 0x08;

/// Vendor register setup (inter-register enable, power, gamma).
const VENDOR_INIT: &[(u8, &[u8])] = &[
    (0xEF, &[]),
    (0xEB, &[0x14]),
    (0xFE, &[]),
    (0xEF, &[]),
    (0xEB, &[0x14]),
    (0x84, &[0x40]),
    (0x85, &[0xFF]),
    (0x86, &[0xFF]),
    (0x87, &[0xFF]),
    (0x88, &[0x0A]),
    (0x89, &[0x21]),
    (0x8A, &[0x00]),
    (0x8B, &[0x80]),
    (0x8C, &[0x01]),
    (0x8D, &[0x01]),
    (0x8E, &[0xFF]),
    (0x8F, &[0xFF]),
    (0xB6, &[0x00, 0x20]),
    (0x90, &[0x08, 0x08, 0x08, 0x08]),
    (0xBD, &[0x06]),
    (0xBC, &[0x00]),
    (0xFF, &[0x60, 0x01, 0x04]),
    (0xC3, &[0x13]),
    (0xC4, &[0x13]),
    (0xC9, &[0x22]),
    (0xBE, &[0x11]),
    (0xE1, &[0x10, 0x0E]),
    (0xDF, &[0x21, 0x0C, 0x02]),
    (0xF0, &[0x45, 0x09, 0x08, 0x08, 0x26, 0x2A]),
    (0xF1, &[0x43, 0x70, 0x72, 0x36, 0x37, 0x6F]),
    (0xF2, &[0x45, 0x09, 0x08, 0x08, 0x26, 0x2A]),
    (0xF3, &[0x43, 0x70, 0x72, 0x36, 0x37, 0x6F]),
    (0xED, &[0x1B, 0x0B]),
    (0xAE, &[0x77]),
    (0xCD, &[0x63]),
    (0x70, &[0x07, 0x07, 0x04, 0x0E, 0x0F, 0x09, 0x07, 0x08, 0x03]),
    (0xE8, &[0x34]),
    (0x62, &[0x18, 0x0D, 0x71, 0xED, 0x70, 0x70, 0x18, 0x0F, 0x71, 0xEF, 0x70, 0x70]),
    (0x63, &[0x18, 0x11, 0x71, 0xF1, 0x70, 0x70, 0x18, 0x13, 0x71, 0xF3, 0x70, 0x70]),
    (0x64, &[0x28, 0x29, 0xF1, 0x01, 0xF1, 0x00, 0x07]),
    (0x66, &[0x3C, 0x00, 0xCD, 0x67, 0x45, 0x45, 0x10, 0x00, 0x00, 0x00]),
    (0x67, &[0x00, 0x3C, 0x00, 0x00, 0x00, 0x01, 0x54, 0x10, 0x32, 0x98]),
    (0x74, &[0x10, 0x85, 0x80, 0x00, 0x00, 0x4E, 0x00]),
    (0x98, &[0x3E, 0x07]),
];

/// SPI configuration for the GC9A01 (62.5 MHz, the fastest clean divider of
/// the 150 MHz system clock the panel accepts).
pub fn display_spi_config() -> SpiConfig {
    let mut config = SpiConfig::default();
    config.frequency = 62_500_000;
    config
}

/// GC9A01 panel: owns the SPI bus and control pins.
pub struct Gc9a01<'d> {
    spi: Spi<'d, embassy_rp::peripherals::SPI1, Async>,
    dc: Output<'d>,
    cs: Output<'d>,
    rst: Output<'d>,
}

impl<'d> Gc9a01<'d> {
    pub fn new(
        spi: Spi<'d, embassy_rp::peripherals::SPI1, Async>,
        dc: Output<'d>,
        cs: Output<'d>,
        rst: Output<'d>,
    ) -> Self {
        Self { spi, dc, cs, rst }
    }

    /// Hardware reset and power-on sequence. Leaves the window at full screen.
    pub async fn init(&mut self) -> Result<(), SpiError> {
        self.rst.set_high();
        Timer::after_millis(10).await;
        self.rst.set_low();
        Timer::after_millis(10).await;
        self.rst.set_high();
        Timer::after_millis(120).await;

        for (cmd, data) in VENDOR_INIT {
            self.write_command(*cmd).await?;
            if !data.is_empty() {
                self.write_data(data).await?;
            }
        }

        // RGB565, BGR panel order, no rotation
        self.write_command(COLMOD).await?;
        self.write_data(&[0x05]).await?;
        self.write_command(MADCTL).await?;
        self.write_data(&[MADCTL_BGR]).await?;

        self.write_command(TEON).await?;
        self.write_command(INVON).await?;

        self.write_command(SLPOUT).await?;
        Timer::after_millis(120).await;
        self.write_command(DISPON).await?;
        Timer::after_millis(20).await;

        self.set_window(0, 0, SCREEN_WIDTH as u16, SCREEN_HEIGHT as u16).await
    }

    /// Send a command byte (DC low, CS low during transfer).
    async fn write_command(
        &mut self,
        cmd: u8,
    ) -> Result<(), SpiError> {
        self.cs.set_low();
        self.dc.set_low();
        let result = self.spi.write(&[cmd]).await;
        self.cs.set_high();
        result
    }

    /// Send data bytes (DC high, CS low during transfer).
    async fn write_data(
        &mut self,
        data: &[u8],
    ) -> Result<(), SpiError> {
        self.cs.set_low();
        self.dc.set_high();
        let result = self.spi.write(data).await;
        self.cs.set_high();
        result
    }

    async fn set_window(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
    ) -> Result<(), SpiError> {
        let x1 = x + w - 1;
        let y1 = y + h - 1;

        self.write_command(CASET).await?;
        self.write_data(&[(x >> 8) as u8, x as u8, (x1 >> 8) as u8, x1 as u8])
            .await?;

        self.write_command(RASET).await?;
        self.write_data(&[(y >> 8) as u8, y as u8, (y1 >> 8) as u8, y1 as u8])
            .await
    }

    /// Send a full big-endian RGB565 frame via DMA.
    pub async fn flush(
        &mut self,
        frame: &[u8],
    ) -> Result<(), SpiError> {
        self.cs.set_low();
        self.dc.set_low();
        // Single-byte command: blocking is cheaper than a DMA setup
        let mut result = self.spi.blocking_write(&[RAMWR]);
        if result.is_ok() {
            self.dc.set_high();
            result = self.spi.write(frame).await;
        }
        self.cs.set_high();
        result
    }
}
