use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

/// Draws an image with upper-half blocks: each cell carries two pixels,
/// the top one as foreground and the bottom one as background.
pub struct Picture<'a> {
    image: &'a RgbImage,
}

impl<'a> Picture<'a> {
    pub fn new(image: &'a RgbImage) -> Self {
        Self { image }
    }
}

impl Widget for Picture<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (width, height) = fit(
            self.image.width(),
            self.image.height(),
            u32::from(area.width),
            u32::from(area.height) * 2,
        );
        if width == 0 || height == 0 {
            return;
        }

        let scaled = imageops::resize(self.image, width, height, FilterType::Triangle);
        let rows = height.div_ceil(2);
        let x0 = area.x + (area.width - width as u16) / 2;
        let y0 = area.y + (area.height - rows as u16) / 2;

        for row in 0..rows {
            for col in 0..width {
                let cell = &mut buf[(x0 + col as u16, y0 + row as u16)];
                cell.set_symbol("▀")
                    .set_fg(rgb(scaled.get_pixel(col, row * 2)));
                if row * 2 + 1 < height {
                    cell.set_bg(rgb(scaled.get_pixel(col, row * 2 + 1)));
                }
            }
        }
    }
}

fn rgb(pixel: &Rgb<u8>) -> Color {
    let [r, g, b] = pixel.0;
    Color::Rgb(r, g, b)
}

/// Largest size with the source aspect ratio inside `max_width` x `max_height`.
fn fit(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 || max_width == 0 || max_height == 0 {
        return (0, 0);
    }
    let scale = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );
    let fitted_width = ((f64::from(width) * scale).round() as u32).clamp(1, max_width);
    let fitted_height = ((f64::from(height) * scale).round() as u32).clamp(1, max_height);
    (fitted_width, fitted_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_keeps_aspect() {
        assert_eq!(fit(100, 150, 20, 60), (20, 30));
        assert_eq!(fit(300, 100, 30, 30), (30, 10));
        assert_eq!(fit(0, 10, 30, 30), (0, 0));
        assert_eq!(fit(10, 10, 0, 30), (0, 0));
    }

    #[test]
    fn test_renders_half_blocks() {
        let image = RgbImage::from_pixel(2, 4, Rgb([255, 0, 0]));
        let area = Rect::new(0, 0, 2, 2);
        let mut buf = Buffer::empty(area);
        Picture::new(&image).render(area, &mut buf);

        for y in 0..2 {
            for x in 0..2 {
                let cell = &buf[(x, y)];
                assert_eq!(cell.symbol(), "▀");
                assert!(matches!(cell.fg, Color::Rgb(r, g, b) if r > 240 && g < 16 && b < 16));
            }
        }
    }

    #[test]
    fn test_centers_narrow_images() {
        let image = RgbImage::from_pixel(1, 4, Rgb([0, 0, 255]));
        let area = Rect::new(0, 0, 5, 2);
        let mut buf = Buffer::empty(area);
        Picture::new(&image).render(area, &mut buf);

        assert_eq!(buf[(2, 0)].symbol(), "▀");
        assert_eq!(buf[(0, 0)].symbol(), " ");
        assert_eq!(buf[(4, 1)].symbol(), " ");
    }

    #[test]
    fn test_empty_area_is_noop() {
        let image = RgbImage::from_pixel(4, 4, Rgb([0, 255, 0]));
        let mut buf = Buffer::empty(Rect::new(0, 0, 3, 3));
        Picture::new(&image).render(Rect::new(0, 0, 0, 0), &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), " ");
    }
}
