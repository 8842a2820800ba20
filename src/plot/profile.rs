//! Builds soil profile figures from a loaded [`SoilProfile`].

use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;

use super::{
    contour::{data_range, nice_levels, robust_limits},
    figure::{Figure, PlotStyle, TickFormat},
};
use crate::simulation::SoilProfile;

/// 15 × 5 inches at 100 dpi.
pub const FIGURE_WIDTH: u32 = 1500;
pub const FIGURE_HEIGHT: u32 = 500;

const CONTOUR_LEVELS: usize = 8;

fn time_axis(times: &[NaiveDateTime]) -> Vec<f64> {
    times
        .iter()
        .map(|t| t.and_utc().timestamp() as f64)
        .collect()
}

/// Cell plot of the stored values with depth increasing downwards and
/// robust colour limits.
pub fn quick_profile_figure(profile: &SoilProfile) -> Result<Figure> {
    let z = profile.depth_by_time();
    let values: Vec<f32> = z.iter().copied().collect();
    let limits = robust_limits(&values)
        .ok_or_else(|| anyhow!("{} has no valid values to plot", profile.variable))?;
    let variable = profile.variable;

    Ok(Figure {
        title: format!("{} profile", variable),
        x_label: "time".to_string(),
        y_label: variable.depth_dimension().to_string(),
        colorbar_label: variable.to_string(),
        x: time_axis(&profile.times),
        y: profile.depths.clone(),
        z,
        x_ticks: TickFormat::Date,
        colormap: variable.quick_colormap(),
        style: PlotStyle::Mesh { limits },
        y_increase: false,
        width: FIGURE_WIDTH,
        height: FIGURE_HEIGHT,
    })
}

/// Filled contour plot in display units against negative depth.
pub fn timeseries_figure(profile: &SoilProfile, neon_site: &str) -> Result<Figure> {
    let variable = profile.variable;
    let display = profile.map_values(|v| variable.to_display_unit(v));
    let z = display.depth_by_time();

    let values: Vec<f32> = z.iter().copied().collect();
    let (min, max) =
        data_range(&values).ok_or_else(|| anyhow!("{} has no valid values to plot", variable))?;

    Ok(Figure {
        title: format!(
            "Time-Series of {} Profile at {}",
            variable.display_name(),
            neon_site
        ),
        x_label: "Time".to_string(),
        y_label: "Soil Depth [m]".to_string(),
        colorbar_label: format!("{} {}", variable.display_name(), variable.display_unit()),
        x: time_axis(&display.times),
        y: display.depths.iter().map(|d| -d).collect(),
        z,
        x_ticks: TickFormat::Date,
        colormap: variable.timeseries_colormap(),
        style: PlotStyle::FilledContour {
            levels: nice_levels(min, max, CONTOUR_LEVELS),
        },
        y_increase: true,
        width: FIGURE_WIDTH,
        height: FIGURE_HEIGHT,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::SoilVariable;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ndarray::array;

    fn profile(variable: SoilVariable) -> SoilProfile {
        let day = |d| {
            NaiveDate::from_ymd_opt(2018, 1, d)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
        };

        SoilProfile {
            variable,
            times: vec![day(1), day(2), day(3)],
            depths: vec![0.01, 0.04],
            values: array![[273.15f32, 274.15], [275.15, 276.15], [277.15, f32::NAN]],
        }
    }

    #[test]
    fn should_build_timeseries_figure() {
        let fig = timeseries_figure(&profile(SoilVariable::Tsoi), "ABBY").unwrap();

        assert_eq!(fig.title, "Time-Series of Soil Temperature Profile at ABBY");
        assert_eq!(fig.colorbar_label, "Soil Temperature [\u{00B0}C]");
        assert_eq!(fig.y, vec![-0.01, -0.04]);
        assert_eq!(fig.z.dim(), (2, 3));
        assert_relative_eq!(fig.z[[0, 0]], 0.0, epsilon = 1e-4);
        assert_relative_eq!(fig.z[[1, 1]], 3.0, epsilon = 1e-4);
        assert_relative_eq!(fig.x[1] - fig.x[0], 86_400.0);

        match fig.style {
            PlotStyle::FilledContour { levels } => {
                assert!(levels[0] <= 0.0);
                assert!(*levels.last().unwrap() >= 4.0);
            }
            other => panic!("unexpected style {:?}", other),
        }
    }

    #[test]
    fn should_build_quick_figure_in_stored_units() {
        let fig = quick_profile_figure(&profile(SoilVariable::H2osoi)).unwrap();

        assert!(!fig.y_increase);
        assert_eq!(fig.y, vec![0.01, 0.04]);
        assert_relative_eq!(fig.z[[0, 0]], 273.15);
        assert_eq!((fig.width, fig.height), (1500, 500));

        match fig.style {
            PlotStyle::Mesh { limits: (lo, hi) } => assert!(lo >= 273.15 && hi <= 277.15),
            other => panic!("unexpected style {:?}", other),
        }
    }

    #[test]
    fn should_fail_without_valid_values() {
        let mut empty = profile(SoilVariable::Tsoi);
        empty.values.fill(f32::NAN);

        assert!(timeseries_figure(&empty, "ABBY").is_err());
        assert!(quick_profile_figure(&empty).is_err());
    }
}
