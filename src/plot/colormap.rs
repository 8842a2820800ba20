//! Piecewise-linear colormaps and colormap truncation.

use image::Rgba;

/// Colour stops evenly spaced over [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    pub name: String,
    stops: Vec<[u8; 3]>,
}

impl Colormap {
    pub fn new(name: &str, stops: Vec<[u8; 3]>) -> Self {
        Colormap {
            name: name.to_string(),
            stops,
        }
    }

    pub fn yl_or_rd() -> Self {
        Colormap::new(
            "YlOrRd",
            vec![
                [255, 255, 204],
                [255, 237, 160],
                [254, 217, 118],
                [254, 178, 76],
                [253, 141, 60],
                [252, 78, 42],
                [227, 26, 28],
                [189, 0, 38],
                [128, 0, 38],
            ],
        )
    }

    pub fn viridis() -> Self {
        Colormap::new(
            "viridis",
            vec![
                [68, 1, 84],
                [72, 40, 120],
                [62, 73, 137],
                [49, 104, 142],
                [38, 130, 142],
                [31, 158, 137],
                [53, 183, 121],
                [109, 205, 89],
                [180, 222, 44],
                [253, 231, 37],
            ],
        )
    }

    pub fn gist_earth_r() -> Self {
        Colormap::new(
            "gist_earth_r",
            vec![
                [253, 250, 250],
                [221, 201, 187],
                [190, 172, 119],
                [176, 162, 82],
                [134, 156, 76],
                [84, 145, 75],
                [71, 128, 117],
                [63, 99, 126],
                [48, 53, 120],
                [0, 0, 0],
            ],
        )
    }

    /// Colour at `t` in [0, 1]; values outside are clamped.
    pub fn sample(&self, t: f64) -> [u8; 3] {
        match self.stops.len() {
            0 => [0, 0, 0],
            1 => self.stops[0],
            n => {
                let x = t.clamp(0.0, 1.0) * (n - 1) as f64;
                let i = (x.floor() as usize).min(n - 2);
                let frac = x - i as f64;
                let (a, b) = (self.stops[i], self.stops[i + 1]);
                [0, 1, 2].map(|c| (a[c] as f64 + (b[c] as f64 - a[c] as f64) * frac).round() as u8)
            }
        }
    }

    pub fn rgba(&self, t: f64) -> Rgba<u8> {
        let [r, g, b] = self.sample(t);
        Rgba([r, g, b, 255])
    }

    /// A colormap built from `n` samples of this one between `min` and `max`.
    pub fn truncate(&self, min: f64, max: f64, n: usize) -> Self {
        let n = n.max(2);
        let stops = (0..n)
            .map(|i| self.sample(min + (max - min) * i as f64 / (n - 1) as f64))
            .collect();

        Colormap {
            name: format!("trunc({},{:.2},{:.2})", self.name, min, max),
            stops,
        }
    }
}
