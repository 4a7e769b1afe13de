//! RGB565 offscreen buffers: the frame being composed and the small sprites
//! composited onto it.
//!
//! Pixels are stored big-endian, two bytes each, row-major. That is the byte
//! order the GC9A01 expects on the wire, so a finished frame goes to the SPI
//! DMA as-is.
//!
//! [`Canvas`] implements `DrawTarget`, so all primitive drawing goes through
//! embedded-graphics. On top of that it adds the two compositing operations
//! the gauge needs: keyed blit and keyed rotate-blit.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

#[inline]
fn to_be(color: Rgb565) -> [u8; 2] { RawU16::from(color).into_inner().to_be_bytes() }

#[inline]
fn from_be(bytes: [u8; 2]) -> Rgb565 { Rgb565::from(RawU16::new(u16::from_be_bytes(bytes))) }

/// Bytes needed for a `width` x `height` buffer.
pub const fn buffer_len(
    width: u32,
    height: u32,
) -> usize {
    (width * height * 2) as usize
}

/// Read-only view of a pixel buffer (a baked background or a sprite).
#[derive(Clone, Copy)]
pub struct Image<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> Image<'a> {
    /// View `data` as a `width` x `height` image.
    ///
    /// # Panics
    /// If `data` is shorter than `buffer_len(width, height)`.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
    ) -> Self {
        assert!(data.len() >= buffer_len(width, height), "image buffer too small");
        Self { data, width, height }
    }

    pub const fn width(&self) -> u32 { self.width }

    pub const fn height(&self) -> u32 { self.height }

    pub fn bytes(&self) -> &'a [u8] { &self.data[..buffer_len(self.width, self.height)] }

    /// Pixel at (x, y), `None` outside the image.
    #[inline]
    pub fn pixel(
        &self,
        x: i32,
        y: i32,
    ) -> Option<Rgb565> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 2;
        Some(from_be([self.data[idx], self.data[idx + 1]]))
    }
}

/// Mutable pixel buffer with drawing and compositing.
pub struct Canvas<'a> {
    buf: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    /// Wrap `buf` as a `width` x `height` canvas.
    ///
    /// # Panics
    /// If `buf` is shorter than `buffer_len(width, height)`.
    pub fn new(
        buf: &'a mut [u8],
        width: u32,
        height: u32,
    ) -> Self {
        assert!(buf.len() >= buffer_len(width, height), "canvas buffer too small");
        Self { buf, width, height }
    }

    /// Borrow as a read-only image.
    pub fn as_image(&self) -> Image<'_> { Image::new(&*self.buf, self.width, self.height) }

    /// Frame bytes, ready for the display.
    pub fn bytes(&self) -> &[u8] { &self.buf[..buffer_len(self.width, self.height)] }

    /// Fill with one color.
    pub fn fill(
        &mut self,
        color: Rgb565,
    ) {
        let px = to_be(color);
        let len = buffer_len(self.width, self.height);
        for chunk in self.buf[..len].chunks_exact_mut(2) {
            chunk.copy_from_slice(&px);
        }
    }

    /// Overwrite the whole canvas with `image` (same size).
    ///
    /// # Panics
    /// If the sizes differ.
    pub fn copy_from(
        &mut self,
        image: &Image<'_>,
    ) {
        assert!(image.width == self.width && image.height == self.height, "size mismatch");
        let len = buffer_len(self.width, self.height);
        self.buf[..len].copy_from_slice(image.bytes());
    }

    /// Pixel at (x, y), `None` outside the canvas.
    pub fn pixel(
        &self,
        x: i32,
        y: i32,
    ) -> Option<Rgb565> {
        self.as_image().pixel(x, y)
    }

    #[inline]
    fn set_pixel(
        &mut self,
        x: i32,
        y: i32,
        color: Rgb565,
    ) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            let idx = (y as usize * self.width as usize + x as usize) * 2;
            self.buf[idx..idx + 2].copy_from_slice(&to_be(color));
        }
    }

    /// Copy `src` with its top-left at `origin`, skipping `transparent` pixels.
    pub fn blit(
        &mut self,
        src: &Image<'_>,
        origin: Point,
        transparent: Rgb565,
    ) {
        for sy in 0..src.height as i32 {
            for sx in 0..src.width as i32 {
                if let Some(color) = src.pixel(sx, sy) {
                    if color != transparent {
                        self.set_pixel(origin.x + sx, origin.y + sy, color);
                    }
                }
            }
        }
    }

    /// Rotate `src` clockwise by `angle_deg` about `src_pivot` and composite
    /// it so the pivot lands on `dst_pivot`, skipping `transparent` pixels.
    ///
    /// Uses inverse mapping with nearest-neighbour sampling, so the result
    /// has no holes at any angle.
    pub fn rotate_blit(
        &mut self,
        src: &Image<'_>,
        src_pivot: Point,
        dst_pivot: Point,
        angle_deg: f32,
        transparent: Rgb565,
    ) {
        let rad = angle_deg.to_radians();
        let sin = micromath::F32(rad).sin().0;
        let cos = micromath::F32(rad).cos().0;

        // Radius of the circle swept by the farthest sprite corner.
        let w = src.width as i32;
        let h = src.height as i32;
        let reach_sq = [(0, 0), (w, 0), (0, h), (w, h)]
            .iter()
            .map(|&(cx, cy)| {
                let dx = cx - src_pivot.x;
                let dy = cy - src_pivot.y;
                dx * dx + dy * dy
            })
            .max()
            .unwrap_or(0);
        let reach = micromath::F32(reach_sq as f32).sqrt().0 as i32 + 1;

        let x0 = (dst_pivot.x - reach).max(0);
        let x1 = (dst_pivot.x + reach).min(self.width as i32 - 1);
        let y0 = (dst_pivot.y - reach).max(0);
        let y1 = (dst_pivot.y + reach).min(self.height as i32 - 1);

        for y in y0..=y1 {
            let dy = (y - dst_pivot.y) as f32;
            for x in x0..=x1 {
                let dx = (x - dst_pivot.x) as f32;
                let sx = dx * cos + dy * sin;
                let sy = -dx * sin + dy * cos;
                let px = micromath::F32(sx + 0.5).floor().0 as i32 + src_pivot.x;
                let py = micromath::F32(sy + 0.5).floor().0 as i32 + src_pivot.y;
                if let Some(color) = src.pixel(px, py) {
                    if color != transparent {
                        self.set_pixel(x, y, color);
                    }
                }
            }
        }
    }
}

impl OriginDimensions for Canvas<'_> {
    fn size(&self) -> Size { Size::new(self.width, self.height) }
}

impl DrawTarget for Canvas<'_> {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }

    fn fill_contiguous<I>(
        &mut self,
        area: &Rectangle,
        colors: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        // Colors are row-major over the full `area`, so clipped pixels must
        // still consume their color.
        let mut colors = colors.into_iter();
        for point in area.points() {
            let Some(color) = colors.next() else {
                break;
            };
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }

    fn fill_solid(
        &mut self,
        area: &Rectangle,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let drawable_area = area.intersection(&self.bounding_box());
        if drawable_area.size == Size::zero() {
            return Ok(());
        }

        let px = to_be(color);
        let x_start = drawable_area.top_left.x as usize;
        let width = drawable_area.size.width as usize;
        let stride = self.width as usize * 2;

        for y in drawable_area.rows() {
            let row = y as usize * stride + x_start * 2;
            for chunk in self.buf[row..row + width * 2].chunks_exact_mut(2) {
                chunk.copy_from_slice(&px);
            }
        }
        Ok(())
    }

    fn clear(
        &mut self,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    use super::*;
    use crate::colors::{BLACK, RED, TRANSPARENT, WHITE};

    #[test]
    fn test_pixels_are_big_endian() {
        let mut buf = [0u8; buffer_len(2, 1)];
        let mut canvas = Canvas::new(&mut buf, 2, 1);
        canvas.set_pixel(1, 0, Rgb565::new(0x1F, 0, 0));
        assert_eq!(buf, [0x00, 0x00, 0xF8, 0x00]);
    }

    #[test]
    fn test_out_of_bounds_draw_is_clipped() {
        let mut buf = [0u8; buffer_len(4, 4)];
        let mut canvas = Canvas::new(&mut buf, 4, 4);
        canvas.fill(BLACK);
        Rectangle::new(Point::new(-2, -2), Size::new(4, 4))
            .into_styled(PrimitiveStyle::with_fill(WHITE))
            .draw(&mut canvas)
            .unwrap();
        assert_eq!(canvas.pixel(0, 0), Some(WHITE));
        assert_eq!(canvas.pixel(1, 1), Some(WHITE));
        assert_eq!(canvas.pixel(2, 2), Some(BLACK));
        assert_eq!(canvas.pixel(-1, 0), None);
    }

    #[test]
    fn test_fill_contiguous_clipped_keeps_row_alignment() {
        let mut buf = [0u8; buffer_len(2, 2)];
        let mut canvas = Canvas::new(&mut buf, 2, 2);
        canvas.fill(BLACK);
        // 3x2 area hanging off the right edge: column 2 is clipped
        let colors = [RED, WHITE, BLACK, WHITE, RED, BLACK];
        canvas
            .fill_contiguous(&Rectangle::new(Point::zero(), Size::new(3, 2)), colors)
            .unwrap();
        assert_eq!(canvas.pixel(0, 1), Some(WHITE));
        assert_eq!(canvas.pixel(1, 1), Some(RED));
    }

    #[test]
    fn test_blit_skips_transparent() {
        let mut sprite_buf = [0u8; buffer_len(2, 1)];
        let mut sprite = Canvas::new(&mut sprite_buf, 2, 1);
        sprite.set_pixel(0, 0, TRANSPARENT);
        sprite.set_pixel(1, 0, RED);

        let mut buf = [0u8; buffer_len(4, 4)];
        let mut canvas = Canvas::new(&mut buf, 4, 4);
        canvas.fill(WHITE);
        canvas.blit(&sprite.as_image(), Point::new(1, 2), TRANSPARENT);
        assert_eq!(canvas.pixel(1, 2), Some(WHITE));
        assert_eq!(canvas.pixel(2, 2), Some(RED));
    }

    #[test]
    fn test_rotate_blit_quarter_turns() {
        // 1x5 vertical bar, pivot at the bottom, tip at the top.
        let mut sprite_buf = [0u8; buffer_len(1, 5)];
        let mut sprite = Canvas::new(&mut sprite_buf, 1, 5);
        sprite.fill(RED);
        let pivot = Point::new(0, 4);

        let mut buf = [0u8; buffer_len(11, 11)];
        let mut canvas = Canvas::new(&mut buf, 11, 11);
        let center = Point::new(5, 5);

        canvas.fill(BLACK);
        canvas.rotate_blit(&sprite.as_image(), pivot, center, 0.0, TRANSPARENT);
        assert_eq!(canvas.pixel(5, 1), Some(RED));
        assert_eq!(canvas.pixel(9, 5), Some(BLACK));

        canvas.fill(BLACK);
        canvas.rotate_blit(&sprite.as_image(), pivot, center, 90.0, TRANSPARENT);
        assert_eq!(canvas.pixel(9, 5), Some(RED));
        assert_eq!(canvas.pixel(5, 1), Some(BLACK));

        canvas.fill(BLACK);
        canvas.rotate_blit(&sprite.as_image(), pivot, center, 180.0, TRANSPARENT);
        assert_eq!(canvas.pixel(5, 9), Some(RED));

        canvas.fill(BLACK);
        canvas.rotate_blit(&sprite.as_image(), pivot, center, 270.0, TRANSPARENT);
        assert_eq!(canvas.pixel(1, 5), Some(RED));
    }

    #[test]
    fn test_copy_from_background() {
        let mut bg_buf = [0u8; buffer_len(3, 3)];
        let mut bg = Canvas::new(&mut bg_buf, 3, 3);
        bg.fill(RED);
        let mut buf = [0u8; buffer_len(3, 3)];
        let mut canvas = Canvas::new(&mut buf, 3, 3);
        canvas.copy_from(&bg.as_image());
        assert_eq!(canvas.bytes(), bg.bytes());
    }
}
