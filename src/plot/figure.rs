//! Rasterises depth-time profiles with a colorbar and writes them as PNG.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use image::{ImageFormat, Rgba, RgbaImage};
use ndarray::Array2;

use super::{
    colormap::Colormap,
    contour::{band_index, bilinear, fractional_index, nice_levels},
    text::{draw_text, draw_text_up, line_height, Anchor},
};

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const FRAME: Rgba<u8> = Rgba([0, 0, 0, 255]);

const MARGIN_LEFT: u32 = 90;
const MARGIN_RIGHT: u32 = 150;
const MARGIN_TOP: u32 = 45;
const MARGIN_BOTTOM: u32 = 70;
const COLORBAR_GAP: u32 = 30;
const COLORBAR_WIDTH: u32 = 25;
const TICK_LENGTH: u32 = 6;
const LABEL_GAP: u32 = 4;
const TITLE_SCALE: u32 = 2;

const HOUR: i64 = 3_600;
const DAY: i64 = 24 * HOUR;
const DATE_STEPS: [i64; 13] = [
    HOUR,
    3 * HOUR,
    6 * HOUR,
    12 * HOUR,
    DAY,
    2 * DAY,
    7 * DAY,
    14 * DAY,
    30 * DAY,
    61 * DAY,
    91 * DAY,
    182 * DAY,
    365 * DAY,
];

/// How tick values along an axis are written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickFormat {
    Number,
    /// Coordinates are seconds since 1970-01-01 00:00:00.
    Date,
}

/// How grid values become colours.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotStyle {
    /// One flat cell per grid point, coloured continuously between the limits.
    Mesh { limits: (f64, f64) },
    /// Interpolated field coloured by band, with open-ended bands below the
    /// first and above the last level.
    FilledContour { levels: Vec<f64> },
}

#[derive(Debug, Clone)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub colorbar_label: String,
    /// Column coordinates (one per `z` column).
    pub x: Vec<f64>,
    /// Row coordinates (one per `z` row).
    pub y: Vec<f64>,
    /// `y × x`
    pub z: Array2<f32>,
    pub x_ticks: TickFormat,
    pub colormap: Colormap,
    pub style: PlotStyle,
    /// When false the smallest `y` is drawn at the top.
    pub y_increase: bool,
    pub width: u32,
    pub height: u32,
}

struct Area {
    left: u32,
    top: u32,
    width: u32,
    height: u32,
}

impl Area {
    fn right(&self) -> u32 {
        self.left + self.width - 1
    }

    fn bottom(&self) -> u32 {
        self.top + self.height - 1
    }
}

impl Figure {
    fn check(&self) -> Result<()> {
        let (rows, cols) = self.z.dim();
        if rows == 0 || cols == 0 {
            return Err(anyhow!("Nothing to plot for '{}'", self.title));
        }
        if rows != self.y.len() || cols != self.x.len() {
            return Err(anyhow!(
                "Grid is {}×{} but coordinates are {}×{}",
                rows,
                cols,
                self.y.len(),
                self.x.len()
            ));
        }
        if self.width <= MARGIN_LEFT + MARGIN_RIGHT || self.height <= MARGIN_TOP + MARGIN_BOTTOM {
            return Err(anyhow!("Figure of {}×{} px is too small", self.width, self.height));
        }
        if let PlotStyle::FilledContour { levels } = &self.style {
            if levels.is_empty() {
                return Err(anyhow!("No contour levels for '{}'", self.title));
            }
        }
        Ok(())
    }

    fn plot_area(&self) -> Area {
        Area {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: self.width - MARGIN_LEFT - MARGIN_RIGHT,
            height: self.height - MARGIN_TOP - MARGIN_BOTTOM,
        }
    }

    fn colorbar_area(&self) -> Area {
        Area {
            left: self.width - MARGIN_RIGHT + COLORBAR_GAP,
            top: MARGIN_TOP,
            width: COLORBAR_WIDTH,
            height: self.height - MARGIN_TOP - MARGIN_BOTTOM,
        }
    }

    fn band_count(&self) -> usize {
        match &self.style {
            PlotStyle::Mesh { .. } => 0,
            PlotStyle::FilledContour { levels } => levels.len() + 1,
        }
    }

    /// Colour for a value, or None for missing data.
    fn colour(&self, value: f64) -> Option<Rgba<u8>> {
        if !value.is_finite() {
            return None;
        }

        let t = match &self.style {
            PlotStyle::Mesh { limits: (lo, hi) } => {
                if hi > lo {
                    (value - lo) / (hi - lo)
                } else {
                    0.5
                }
            }
            PlotStyle::FilledContour { levels } => {
                band_index(levels, value) as f64 / (self.band_count() - 1) as f64
            }
        };

        Some(self.colormap.rgba(t))
    }

    fn value_at(&self, x: f64, y: f64) -> f64 {
        let col = fractional_index(&self.x, x);
        let row = fractional_index(&self.y, y);

        match self.style {
            PlotStyle::Mesh { .. } => self.z[[row.round() as usize, col.round() as usize]] as f64,
            PlotStyle::FilledContour { .. } => bilinear(&self.z, row, col),
        }
    }

    pub fn render(&self) -> Result<RgbaImage> {
        self.check()?;

        let mut img = RgbaImage::from_pixel(self.width, self.height, BACKGROUND);
        let area = self.plot_area();
        let (x_min, x_max) = axis_range(&self.x);
        let (y_min, y_max) = axis_range(&self.y);

        for py in 0..area.height {
            let fy = (py as f64 + 0.5) / area.height as f64;
            let y = if self.y_increase {
                y_max - fy * (y_max - y_min)
            } else {
                y_min + fy * (y_max - y_min)
            };

            for px in 0..area.width {
                let x = x_min + (px as f64 + 0.5) / area.width as f64 * (x_max - x_min);
                if let Some(colour) = self.colour(self.value_at(x, y)) {
                    img.put_pixel(area.left + px, area.top + py, colour);
                }
            }
        }

        draw_frame(&mut img, &area);
        self.draw_ticks(&mut img, &area, (x_min, x_max), (y_min, y_max));
        self.draw_colorbar(&mut img);
        self.draw_labels(&mut img, &area);

        Ok(img)
    }

    fn draw_ticks(&self, img: &mut RgbaImage, area: &Area, x: (f64, f64), y: (f64, f64)) {
        let half_line = (line_height(1) / 2) as i64;

        for (tick, label) in axis_ticks(self.x_ticks, x, 6) {
            let px = area.left + ((tick - x.0) / (x.1 - x.0) * (area.width - 1) as f64) as u32;
            for dy in 1..=TICK_LENGTH {
                img.put_pixel(px, area.bottom() + dy, FRAME);
            }
            let top = area.bottom() + TICK_LENGTH + LABEL_GAP;
            draw_text(img, &label, (px as i64, top as i64), Anchor::Middle, 1, FRAME);
        }

        for (tick, label) in axis_ticks(TickFormat::Number, y, 5) {
            let frac = (tick - y.0) / (y.1 - y.0);
            let frac = if self.y_increase { 1.0 - frac } else { frac };
            let py = area.top + (frac * (area.height - 1) as f64) as u32;
            for dx in 1..=TICK_LENGTH {
                img.put_pixel(area.left - dx, py, FRAME);
            }
            let right = area.left - TICK_LENGTH - LABEL_GAP;
            draw_text(img, &label, (right as i64, py as i64 - half_line), Anchor::End, 1, FRAME);
        }
    }

    fn draw_labels(&self, img: &mut RgbaImage, area: &Area) {
        let title_top = MARGIN_TOP.saturating_sub(line_height(TITLE_SCALE)) / 2;
        draw_text(
            img,
            &self.title,
            ((self.width / 2) as i64, title_top as i64),
            Anchor::Middle,
            TITLE_SCALE,
            FRAME,
        );

        let x_label_top = area.bottom() + TICK_LENGTH + 2 * LABEL_GAP + line_height(1) + 12;
        let centre = (area.left + area.width / 2) as i64;
        draw_text(img, &self.x_label, (centre, x_label_top as i64), Anchor::Middle, 1, FRAME);

        let middle = (area.top + area.height / 2) as i64;
        draw_text_up(img, &self.y_label, (12, middle), 1, FRAME);

        let colorbar_label_left = self.width - 12 - line_height(1);
        draw_text_up(img, &self.colorbar_label, (colorbar_label_left as i64, middle), 1, FRAME);
    }

    fn draw_colorbar(&self, img: &mut RgbaImage) {
        let bar = self.colorbar_area();

        for py in 0..bar.height {
            // bottom of the bar is the low end
            let t = 1.0 - (py as f64 + 0.5) / bar.height as f64;
            let colour = match &self.style {
                PlotStyle::Mesh { .. } => self.colormap.rgba(t),
                PlotStyle::FilledContour { .. } => {
                    let bands = self.band_count();
                    let band = ((t * bands as f64) as usize).min(bands - 1);
                    self.colormap.rgba(band as f64 / (bands - 1) as f64)
                }
            };
            for px in 0..bar.width {
                img.put_pixel(bar.left + px, bar.top + py, colour);
            }
        }

        let ticks: Vec<(u32, String)> = match &self.style {
            PlotStyle::FilledContour { levels } => {
                let step = level_step(levels);
                let bands = self.band_count() as u32;
                levels
                    .iter()
                    .zip(1..bands)
                    .map(|(&level, edge)| {
                        let py = bar.top + bar.height - edge * bar.height / bands;
                        (py.min(bar.bottom()), format_number(level, step))
                    })
                    .collect()
            }
            PlotStyle::Mesh { limits } => axis_ticks(TickFormat::Number, *limits, 5)
                .into_iter()
                .map(|(tick, label)| {
                    let frac = (tick - limits.0) / (limits.1 - limits.0);
                    let py = bar.bottom() - (frac * (bar.height - 1) as f64) as u32;
                    (py, label)
                })
                .collect(),
        };

        let label_left = (bar.right() + 1 + TICK_LENGTH + LABEL_GAP) as i64;
        let half_line = (line_height(1) / 2) as i64;
        for (py, label) in ticks {
            for dx in 0..TICK_LENGTH {
                img.put_pixel(bar.right() + 1 + dx, py, FRAME);
            }
            draw_text(img, &label, (label_left, py as i64 - half_line), Anchor::Start, 1, FRAME);
        }

        draw_frame(img, &bar);
    }

    /// Renders the figure and writes it as PNG.
    pub fn save(&self, path: &Path) -> Result<()> {
        let img = self.render()?;
        img.save_with_format(path, ImageFormat::Png)
            .with_context(|| format!("Failed to write plot to {}", path.display()))?;
        log::info!("Wrote {}×{} plot to {}", self.width, self.height, path.display());

        Ok(())
    }
}

fn axis_range(coords: &[f64]) -> (f64, f64) {
    let min = coords.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = coords.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if max > min {
        (min, max)
    } else {
        (min - 0.5, min + 0.5)
    }
}

/// Tick positions inside `range` with their labels.
fn axis_ticks(format: TickFormat, (lo, hi): (f64, f64), target: usize) -> Vec<(f64, String)> {
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return Vec::new();
    }

    match format {
        TickFormat::Number => {
            let levels = nice_levels(lo, hi, target);
            let step = level_step(&levels);
            levels
                .into_iter()
                .filter(|&tick| tick >= lo && tick <= hi)
                .map(|tick| (tick, format_number(tick, step)))
                .collect()
        }
        TickFormat::Date => {
            let raw = (hi - lo) / target.max(1) as f64;
            let step = DATE_STEPS
                .into_iter()
                .find(|&step| step as f64 >= raw)
                .unwrap_or_else(|| (raw / (365 * DAY) as f64).ceil() as i64 * 365 * DAY);
            let pattern = if step < DAY { "%m-%d %H:%M" } else { "%Y-%m-%d" };

            let first = (lo / step as f64).ceil() as i64;
            let last = (hi / step as f64).floor() as i64;
            (first..=last)
                .filter_map(|k| {
                    let seconds = k.checked_mul(step)?;
                    let label = DateTime::<Utc>::from_timestamp(seconds, 0)?
                        .format(pattern)
                        .to_string();
                    Some((seconds as f64, label))
                })
                .collect()
        }
    }
}

fn level_step(levels: &[f64]) -> f64 {
    match levels {
        [first, second, ..] => second - first,
        _ => 1.0,
    }
}

/// Writes `value` with as many decimals as `step` needs.
fn format_number(value: f64, step: f64) -> String {
    let decimals = (0..6)
        .find(|&d| {
            let scaled = step.abs() * 10f64.powi(d);
            (scaled - scaled.round()).abs() < 1e-6
        })
        .unwrap_or(6) as usize;
    let text = format!("{:.*}", decimals, value);

    // "-0" and "-0.00" read as zero
    if text.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        text.trim_start_matches('-').to_string()
    } else {
        text
    }
}

fn draw_frame(img: &mut RgbaImage, area: &Area) {
    for px in area.left..=area.right() {
        img.put_pixel(px, area.top, FRAME);
        img.put_pixel(px, area.bottom(), FRAME);
    }
    for py in area.top..=area.bottom() {
        img.put_pixel(area.left, py, FRAME);
        img.put_pixel(area.right(), py, FRAME);
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::TempDir;

    fn figure(style: PlotStyle) -> Figure {
        Figure {
            title: "test".to_string(),
            x_label: "Time".to_string(),
            y_label: "Soil Depth [m]".to_string(),
            colorbar_label: "value".to_string(),
            x: vec![0.0, 1.0, 2.0],
            y: vec![-0.1, -0.5],
            z: array![[0.0f32, 1.0, 2.0], [3.0, 4.0, f32::NAN]],
            x_ticks: TickFormat::Number,
            colormap: Colormap::new("bw", vec![[0, 0, 0], [255, 255, 255]]),
            style,
            y_increase: true,
            width: 400,
            height: 200,
        }
    }

    #[test]
    fn should_render_contour_with_frame() {
        let fig = figure(PlotStyle::FilledContour {
            levels: vec![0.0, 1.0, 2.0, 3.0, 4.0],
        });
        let img = fig.render().unwrap();

        assert_eq!(img.dimensions(), (400, 200));
        assert_eq!(*img.get_pixel(MARGIN_LEFT, MARGIN_TOP + 10), FRAME);
        assert_eq!(*img.get_pixel(5, 5), BACKGROUND);

        // shallow row is at the top, lowest band is darkest
        let top_left = img.get_pixel(MARGIN_LEFT + 2, MARGIN_TOP + 2);
        let bottom_left = img.get_pixel(MARGIN_LEFT + 2, 200 - MARGIN_BOTTOM - 3);
        assert!(top_left[0] < bottom_left[0]);
    }

    #[test]
    fn should_render_mesh_with_flipped_axis() {
        let mut fig = figure(PlotStyle::Mesh { limits: (0.0, 4.0) });
        fig.y = vec![0.1, 0.5];
        fig.y_increase = false;
        let img = fig.render().unwrap();

        let top_left = img.get_pixel(MARGIN_LEFT + 2, MARGIN_TOP + 2);
        assert_eq!(*top_left, Rgba([0, 0, 0, 255]));

        // missing cell stays white
        let area_right = 400 - MARGIN_RIGHT - 3;
        let bottom_right = img.get_pixel(area_right, 200 - MARGIN_BOTTOM - 3);
        assert_eq!(*bottom_right, BACKGROUND);
    }

    #[test]
    fn should_reject_mismatched_grid() {
        let mut fig = figure(PlotStyle::Mesh { limits: (0.0, 1.0) });
        fig.x.pop();
        assert!(fig.render().is_err());

        let empty = figure(PlotStyle::FilledContour { levels: vec![] });
        assert!(empty.render().is_err());
    }

    fn has_ink(img: &RgbaImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> bool {
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .any(|(x, y)| *img.get_pixel(x, y) != BACKGROUND)
    }

    #[test]
    fn should_draw_title_labels_and_tick_values() {
        let fig = figure(PlotStyle::FilledContour {
            levels: vec![0.0, 1.0, 2.0, 3.0, 4.0],
        });
        let img = fig.render().unwrap();
        let bottom = 200 - MARGIN_BOTTOM;

        // title
        assert!(has_ink(&img, 100..300, 0..MARGIN_TOP - 10));
        // y label left of the y tick values
        assert!(has_ink(&img, 0..30, MARGIN_TOP..bottom));
        // x tick values below the ticks
        let plot_columns = MARGIN_LEFT..400 - MARGIN_RIGHT;
        assert!(has_ink(&img, plot_columns.clone(), bottom + TICK_LENGTH..bottom + 22));
        // x label
        assert!(has_ink(&img, plot_columns, bottom + 26..200));
        // colorbar tick values
        let colorbar_right = 400 - MARGIN_RIGHT + COLORBAR_GAP + COLORBAR_WIDTH;
        assert!(has_ink(&img, colorbar_right + TICK_LENGTH..370, MARGIN_TOP..bottom));
        // colorbar label
        assert!(has_ink(&img, 372..400, MARGIN_TOP..bottom));

        let mut blank = fig.clone();
        blank.title.clear();
        blank.colorbar_label.clear();
        let img = blank.render().unwrap();
        assert!(!has_ink(&img, 100..300, 0..MARGIN_TOP - 10));
        assert!(!has_ink(&img, 372..400, MARGIN_TOP..bottom));
    }

    #[test]
    fn should_label_ticks() {
        let ticks = axis_ticks(TickFormat::Number, (-0.5, -0.1), 5);
        let labels: Vec<&str> = ticks.iter().map(|(_, label)| label.as_str()).collect();
        assert_eq!(labels, vec!["-0.5", "-0.4", "-0.3", "-0.2", "-0.1"]);

        assert_eq!(format_number(-0.0, 0.5), "0.0");
        assert_eq!(format_number(2.5, 2.5), "2.5");
        assert_eq!(format_number(20.0, 5.0), "20");
    }

    #[test]
    fn should_label_dates_on_day_boundaries() {
        // 2018-01-01 12:00 to 2018-01-13 12:00 UTC
        let start = 1_514_808_000.0;
        let ticks = axis_ticks(TickFormat::Date, (start, start + 12.0 * 86_400.0), 6);

        assert_eq!(ticks[0].1, "2018-01-03");
        assert_eq!(ticks[1].1, "2018-01-05");
        assert_eq!(ticks.last().unwrap().1, "2018-01-13");
        assert!(ticks.iter().all(|(t, _)| (*t as i64) % 86_400 == 0));
    }

    #[test]
    fn should_save_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.png");
        figure(PlotStyle::Mesh { limits: (0.0, 4.0) }).save(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
