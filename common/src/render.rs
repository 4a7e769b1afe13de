//! Frame composition for the round engine gauge.
//!
//! A frame is built in a fixed order with no waiting in between:
//!
//! 1. Copy the baked background (normal or low-oil-pressure warning).
//! 2. Draw the coolant arc for the current temperature.
//! 3. Render speed, coolant and engine hours into their text sprites and
//!    composite them, keyed on [`TRANSPARENT`].
//! 4. Rotate the needle sprite to the speed angle and composite it.
//! 5. Hand the finished frame to a [`DisplayCommit`] in one transfer.
//!
//! Steps 1-4 depend only on the [`FrameInput`] and the configuration, so the
//! same input always produces the same bytes.

use core::fmt::Write;

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Circle, Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, RoundedRectangle,
    StrokeAlignment, Triangle,
};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use heapless::String;
use profont::{PROFONT_10_POINT, PROFONT_14_POINT, PROFONT_24_POINT};

use crate::canvas::{Canvas, Image, buffer_len};
use crate::colors::{BLACK, COOLANT_TRACK, GRAY, HUB, RED, RIM, TRANSPARENT, WHITE};
use crate::config::{
    COOLANT_TEXT_HEIGHT, COOLANT_TEXT_POSITION_X, COOLANT_TEXT_POSITION_Y, COOLANT_TEXT_WIDTH,
    ENGINE_HOURS_POSITION_X, ENGINE_HOURS_POSITION_Y, ENGINE_HOURS_TEXT_HEIGHT,
    ENGINE_HOURS_TEXT_WIDTH, NEEDLE_PIVOT_Y, NEEDLE_SPRITE_HEIGHT, NEEDLE_SPRITE_WIDTH,
    SCREEN_HEIGHT, SCREEN_WIDTH, SPEED_TEXT_HEIGHT, SPEED_TEXT_POSITION_X, SPEED_TEXT_POSITION_Y,
    SPEED_TEXT_WIDTH,
};
use crate::gauge::{ArcConfig, NeedleConfig, draw_ring_arc};
use crate::store::TelemetrySnapshot;

/// Bytes in the speed text sprite.
pub const SPEED_SPRITE_LEN: usize = buffer_len(SPEED_TEXT_WIDTH, SPEED_TEXT_HEIGHT);
/// Bytes in the coolant text sprite.
pub const COOLANT_SPRITE_LEN: usize = buffer_len(COOLANT_TEXT_WIDTH, COOLANT_TEXT_HEIGHT);
/// Bytes in the engine hours text sprite.
pub const HOURS_SPRITE_LEN: usize = buffer_len(ENGINE_HOURS_TEXT_WIDTH, ENGINE_HOURS_TEXT_HEIGHT);
/// Bytes in the needle sprite.
pub const NEEDLE_SPRITE_LEN: usize = buffer_len(NEEDLE_SPRITE_WIDTH, NEEDLE_SPRITE_HEIGHT);

/// Shown instead of the engine speed while the speed message is stale.
pub const NO_DATA_TEXT: &str = "----";

/// Final one-blit transfer of a composed frame.
pub trait DisplayCommit {
    type Error;

    /// Send a full big-endian RGB565 frame.
    fn commit(
        &mut self,
        frame: &[u8],
    ) -> Result<(), Self::Error>;
}

/// Everything a frame depends on besides configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInput {
    pub snapshot: TelemetrySnapshot,
    /// The primary speed message has timed out.
    pub stale: bool,
}

/// Render configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderConfig {
    pub arc: ArcConfig,
    pub needle: NeedleConfig,
}

impl RenderConfig {
    pub const DEFAULT: Self = Self {
        arc: ArcConfig::DEFAULT,
        needle: NeedleConfig::DEFAULT,
    };
}

impl Default for RenderConfig {
    fn default() -> Self { Self::DEFAULT }
}

/// The two pre-baked backgrounds.
#[derive(Clone, Copy)]
pub struct Backgrounds<'a> {
    pub normal: Image<'a>,
    pub warning: Image<'a>,
}

impl<'a> Backgrounds<'a> {
    /// Background for the current warning state.
    pub const fn select(
        &self,
        low_oil_pressure: bool,
    ) -> &Image<'a> {
        if low_oil_pressure { &self.warning } else { &self.normal }
    }
}

// =============================================================================
// Baking
// =============================================================================

/// Point at `radius` from `center` along a needle angle (0° = 12 o'clock).
fn polar(
    center: Point,
    angle_deg: f32,
    radius: f32,
) -> Point {
    let rad = angle_deg.to_radians();
    let x = micromath::F32(rad).sin().0 * radius;
    let y = -micromath::F32(rad).cos().0 * radius;
    center + Point::new(micromath::F32(x).round().0 as i32, micromath::F32(y).round().0 as i32)
}

/// Draw a dial background into `buf` (a full frame).
///
/// The face carries the RPM scale (0..40 x100), the empty coolant track and
/// the captions. The warning variant adds a red rim and an OIL badge.
pub fn bake_background(
    buf: &mut [u8],
    config: &RenderConfig,
    warning: bool,
) {
    let mut canvas = Canvas::new(buf, SCREEN_WIDTH, SCREEN_HEIGHT);
    let center = config.needle.pivot;
    let Ok(()) = draw_dial(&mut canvas, config, center, warning);
}

fn draw_dial(
    canvas: &mut Canvas<'_>,
    config: &RenderConfig,
    center: Point,
    warning: bool,
) -> Result<(), core::convert::Infallible> {
    canvas.fill(BLACK);

    let rim = if warning { RED } else { RIM };
    let rim_width = if warning { 4 } else { 2 };
    Circle::with_center(center, SCREEN_WIDTH - 2)
        .into_styled(
            PrimitiveStyleBuilder::new()
                .stroke_color(rim)
                .stroke_width(rim_width)
                .stroke_alignment(StrokeAlignment::Inside)
                .build(),
        )
        .draw(canvas)?;

    let arc = &config.arc;
    draw_ring_arc(
        canvas,
        center,
        arc.inner_radius,
        arc.outer_radius,
        arc.start_angle,
        arc.total_sweep(),
        COOLANT_TRACK,
    )?;

    // RPM ticks every 250, labelled every 1000.
    let needle = &config.needle;
    let label_style = MonoTextStyle::new(&PROFONT_14_POINT, WHITE);
    let centered = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();
    let steps = (needle.max_speed / 250.0) as u32;
    for step in 0..=steps {
        let rpm = step as f32 * 250.0;
        let angle = needle.angle_for(rpm);
        let major = step % 2 == 0;
        let (inner, color, width) = if major { (84.0, WHITE, 3) } else { (90.0, GRAY, 1) };
        Line::new(polar(center, angle, inner), polar(center, angle, 96.0))
            .into_styled(PrimitiveStyle::with_stroke(color, width))
            .draw(canvas)?;

        if step % 4 == 0 {
            let mut label: String<4> = String::new();
            let _ = write!(label, "{}", (rpm / 100.0) as u32);
            Text::with_text_style(&label, polar(center, angle, 70.0), label_style, centered)
                .draw(canvas)?;
        }
    }

    Text::with_text_style(
        "x100 RPM",
        center + Point::new(0, -32),
        MonoTextStyle::new(&PROFONT_10_POINT, GRAY),
        centered,
    )
    .draw(canvas)?;
    Text::with_text_style(
        "HOURS",
        Point::new(
            ENGINE_HOURS_POSITION_X + (ENGINE_HOURS_TEXT_WIDTH / 2) as i32,
            ENGINE_HOURS_POSITION_Y - 7,
        ),
        MonoTextStyle::new(&PROFONT_10_POINT, GRAY),
        centered,
    )
    .draw(canvas)?;

    if warning {
        let badge = Rectangle::with_center(center + Point::new(0, -62), Size::new(48, 22));
        RoundedRectangle::with_equal_corners(badge, Size::new(6, 6))
            .into_styled(PrimitiveStyle::with_fill(RED))
            .draw(canvas)?;
        Text::with_text_style("OIL", badge.center(), MonoTextStyle::new(&PROFONT_14_POINT, WHITE), centered)
            .draw(canvas)?;
    }
    Ok(())
}

/// Draw the needle sprite into `buf`: a tapered red pointer, tip up, pivot at
/// `(NEEDLE_SPRITE_WIDTH / 2, NEEDLE_PIVOT_Y)`, on a transparent background.
pub fn bake_needle(buf: &mut [u8]) {
    let mut sprite = Canvas::new(buf, NEEDLE_SPRITE_WIDTH, NEEDLE_SPRITE_HEIGHT);
    sprite.fill(TRANSPARENT);
    let mid = (NEEDLE_SPRITE_WIDTH / 2) as i32;
    let right = NEEDLE_SPRITE_WIDTH as i32 - 1;
    let fill = PrimitiveStyle::with_fill(RED);
    let Ok(()) = Triangle::new(Point::new(mid, 0), Point::new(0, NEEDLE_PIVOT_Y), Point::new(right, NEEDLE_PIVOT_Y))
        .into_styled(fill)
        .draw(&mut sprite);
    let Ok(()) = Rectangle::new(
        Point::new(mid - 2, NEEDLE_PIVOT_Y),
        Size::new(5, NEEDLE_SPRITE_HEIGHT - NEEDLE_PIVOT_Y as u32),
    )
    .into_styled(fill)
    .draw(&mut sprite);
}

// =============================================================================
// Per-Frame Composition
// =============================================================================

/// Owns the sprite buffers and composes frames.
///
/// About 25 KB; keep it in a `static` on the firmware.
pub struct GaugeRenderer {
    config: RenderConfig,
    speed: [u8; SPEED_SPRITE_LEN],
    coolant: [u8; COOLANT_SPRITE_LEN],
    hours: [u8; HOURS_SPRITE_LEN],
    needle: [u8; NEEDLE_SPRITE_LEN],
}

impl GaugeRenderer {
    /// Renderer with zeroed sprites. Call [`Self::bake`] before composing.
    pub const fn new(config: RenderConfig) -> Self {
        Self {
            config,
            speed: [0; SPEED_SPRITE_LEN],
            coolant: [0; COOLANT_SPRITE_LEN],
            hours: [0; HOURS_SPRITE_LEN],
            needle: [0; NEEDLE_SPRITE_LEN],
        }
    }

    /// Bake the needle sprite.
    pub fn bake(&mut self) { bake_needle(&mut self.needle); }

    pub const fn config(&self) -> &RenderConfig { &self.config }

    /// Needle angle for this input: the rest angle while stale.
    pub fn needle_angle(
        &self,
        input: &FrameInput,
    ) -> f32 {
        if input.stale {
            self.config.needle.rest_angle()
        } else {
            self.config.needle.angle_for(input.snapshot.engine_speed_rpm)
        }
    }

    /// Speed overlay text for this input.
    pub fn speed_text(input: &FrameInput) -> String<8> {
        let mut s = String::new();
        if input.stale {
            let _ = s.push_str(NO_DATA_TEXT);
        } else {
            let _ = write!(s, "{:.0}", input.snapshot.engine_speed_rpm.max(0.0));
        }
        s
    }

    /// Compose a frame into `frame` (steps 1-4).
    pub fn compose(
        &mut self,
        input: &FrameInput,
        backgrounds: &Backgrounds<'_>,
        frame: &mut Canvas<'_>,
    ) {
        let snap = &input.snapshot;

        // 1. Background
        frame.copy_from(backgrounds.select(snap.low_oil_pressure_warning));

        // 2. Coolant arc
        let arc = &self.config.arc;
        let center = self.config.needle.pivot;
        let Ok(()) = draw_ring_arc(
            frame,
            center,
            arc.inner_radius,
            arc.outer_radius,
            arc.start_angle,
            arc.sweep_for(snap.coolant_temp_c),
            arc.color_for(snap.coolant_temp_c),
        );

        // 3. Text overlays
        let speed = Self::speed_text(input);
        let mut coolant: String<8> = String::new();
        let _ = write!(coolant, "{:.0}C", snap.coolant_temp_c);
        let mut hours: String<12> = String::new();
        let _ = write!(hours, "{:.1}h", snap.engine_hours);

        composite_text(
            frame,
            &mut self.speed,
            Size::new(SPEED_TEXT_WIDTH, SPEED_TEXT_HEIGHT),
            Point::new(SPEED_TEXT_POSITION_X, SPEED_TEXT_POSITION_Y),
            &PROFONT_24_POINT,
            &speed,
        );
        composite_text(
            frame,
            &mut self.coolant,
            Size::new(COOLANT_TEXT_WIDTH, COOLANT_TEXT_HEIGHT),
            Point::new(COOLANT_TEXT_POSITION_X, COOLANT_TEXT_POSITION_Y),
            &PROFONT_14_POINT,
            &coolant,
        );
        composite_text(
            frame,
            &mut self.hours,
            Size::new(ENGINE_HOURS_TEXT_WIDTH, ENGINE_HOURS_TEXT_HEIGHT),
            Point::new(ENGINE_HOURS_POSITION_X, ENGINE_HOURS_POSITION_Y),
            &PROFONT_14_POINT,
            &hours,
        );

        // 4. Needle and hub
        let needle = Image::new(&self.needle, NEEDLE_SPRITE_WIDTH, NEEDLE_SPRITE_HEIGHT);
        let pivot = Point::new((NEEDLE_SPRITE_WIDTH / 2) as i32, NEEDLE_PIVOT_Y);
        frame.rotate_blit(&needle, pivot, center, self.needle_angle(input), TRANSPARENT);
        let Ok(()) = Circle::with_center(center, 16)
            .into_styled(PrimitiveStyle::with_fill(HUB))
            .draw(frame);
    }

    /// Compose and commit (steps 1-5).
    pub fn render<D: DisplayCommit + ?Sized>(
        &mut self,
        input: &FrameInput,
        backgrounds: &Backgrounds<'_>,
        frame: &mut Canvas<'_>,
        display: &mut D,
    ) -> Result<(), D::Error> {
        self.compose(input, backgrounds, frame);
        display.commit(frame.bytes())
    }
}

/// Render `text` centered into `sprite_buf` on the key color, then blit the
/// glyph pixels onto `frame` at `origin`.
fn composite_text(
    frame: &mut Canvas<'_>,
    sprite_buf: &mut [u8],
    size: Size,
    origin: Point,
    font: &MonoFont<'_>,
    text: &str,
) {
    let mut sprite = Canvas::new(sprite_buf, size.width, size.height);
    sprite.fill(TRANSPARENT);
    let style = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();
    let center = Point::new((size.width / 2) as i32, (size.height / 2) as i32);
    let Ok(_) = Text::with_text_style(text, center, MonoTextStyle::new(font, WHITE), style).draw(&mut sprite);
    frame.blit(&sprite.as_image(), origin, TRANSPARENT);
}
