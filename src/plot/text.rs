//! Bitmap text for figure titles, labels and tick values.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgba, RgbaImage};

const GLYPH_SIZE: u32 = 8;

/// Which point of the text the x coordinate refers to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Length of `text` in pixels along its baseline.
pub fn text_length(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale
}

/// Height of one line of text in pixels.
pub fn line_height(scale: u32) -> u32 {
    GLYPH_SIZE * scale
}

fn fill_square(img: &mut RgbaImage, x: i64, y: i64, scale: u32, colour: Rgba<u8>) {
    for dy in 0..scale as i64 {
        for dx in 0..scale as i64 {
            let (px, py) = (x + dx, y + dy);
            if px >= 0 && py >= 0 && (px as u32) < img.width() && (py as u32) < img.height() {
                img.put_pixel(px as u32, py as u32, colour);
            }
        }
    }
}

fn anchored(start: i64, length: u32, anchor: Anchor) -> i64 {
    match anchor {
        Anchor::Start => start,
        Anchor::Middle => start - length as i64 / 2,
        Anchor::End => start - length as i64,
    }
}

/// Draws horizontal text with its top edge at `y`. Pixels outside the image are dropped.
pub fn draw_text(
    img: &mut RgbaImage,
    text: &str,
    (x, y): (i64, i64),
    anchor: Anchor,
    scale: u32,
    colour: Rgba<u8>,
) {
    let left = anchored(x, text_length(text, scale), anchor);
    let cell = (GLYPH_SIZE * scale) as i64;

    for (i, c) in text.chars().enumerate() {
        let glyph_left = left + i as i64 * cell;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) != 0 {
                    let px = glyph_left + (col * scale) as i64;
                    let py = y + row as i64 * scale as i64;
                    fill_square(img, px, py, scale, colour);
                }
            }
        }
    }
}

/// Draws text reading bottom to top with its left edge at `x`, centred on `y`.
pub fn draw_text_up(img: &mut RgbaImage, text: &str, (x, y): (i64, i64), scale: u32, colour: Rgba<u8>) {
    let length = text_length(text, scale);
    let bottom = y + length as i64 / 2;
    let cell = (GLYPH_SIZE * scale) as i64;

    for (i, c) in text.chars().enumerate() {
        let glyph_bottom = bottom - i as i64 * cell;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) != 0 {
                    // quarter turn anticlockwise: glyph rows become columns
                    let px = x + row as i64 * scale as i64;
                    let py = glyph_bottom - (col as i64 + 1) * scale as i64;
                    fill_square(img, px, py, scale, colour);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn ink(img: &RgbaImage) -> Vec<(u32, u32)> {
        img.enumerate_pixels()
            .filter(|(_, _, p)| **p == BLACK)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn should_measure_text() {
        assert_eq!(text_length("Time", 1), 32);
        assert_eq!(text_length("[\u{00B0}C]", 2), 64);
        assert_eq!(line_height(2), 16);
    }

    #[test]
    fn should_draw_text_inside_its_box() {
        let mut img = RgbaImage::from_pixel(100, 40, WHITE);
        draw_text(&mut img, "Depth", (50, 10), Anchor::Middle, 1, BLACK);

        let pixels = ink(&img);
        assert!(!pixels.is_empty());
        assert!(pixels.iter().all(|&(x, y)| (30..70).contains(&x) && (10..18).contains(&y)));
    }

    #[test]
    fn should_draw_end_anchored_text_left_of_x() {
        let mut img = RgbaImage::from_pixel(100, 20, WHITE);
        draw_text(&mut img, "0.25", (90, 4), Anchor::End, 1, BLACK);

        assert!(ink(&img).iter().all(|&(x, _)| (58..90).contains(&x)));
    }

    #[test]
    fn should_draw_rotated_text_upwards() {
        let mut img = RgbaImage::from_pixel(20, 100, WHITE);
        draw_text_up(&mut img, "Soil", (4, 50), 1, BLACK);

        let pixels = ink(&img);
        assert!(!pixels.is_empty());
        assert!(pixels.iter().all(|&(x, y)| (4..12).contains(&x) && (34..66).contains(&y)));
    }

    #[test]
    fn should_clip_text_at_image_edges() {
        let mut img = RgbaImage::from_pixel(10, 10, WHITE);
        draw_text(&mut img, "clipped text", (-20, -4), Anchor::Start, 2, BLACK);
        draw_text_up(&mut img, "clipped text", (6, 5), 1, BLACK);

        assert!(!ink(&img).is_empty());
    }
}
