use std::{fmt, ops::Range};

use crate::plot::colormap::Colormap;

const KELVIN_OFFSET: f32 = 273.15;

/// Soil variables that can be plotted against depth and time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoilVariable {
    /// Soil temperature on ground levels
    Tsoi,
    /// Volumetric soil water on soil levels
    H2osoi,
}

impl SoilVariable {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "TSOI" => Some(SoilVariable::Tsoi),
            "H2OSOI" => Some(SoilVariable::H2osoi),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SoilVariable::Tsoi => "TSOI",
            SoilVariable::H2osoi => "H2OSOI",
        }
    }

    /// Name of the depth dimension the variable is defined on.
    pub fn depth_dimension(&self) -> &'static str {
        match self {
            SoilVariable::Tsoi => "levgrnd",
            SoilVariable::H2osoi => "levsoi",
        }
    }

    /// Levels shown in profile plots.
    pub fn level_range(&self) -> Range<usize> {
        match self {
            SoilVariable::Tsoi => 0..9,
            SoilVariable::H2osoi => 0..15,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SoilVariable::Tsoi => "Soil Temperature",
            SoilVariable::H2osoi => "Soil Moisture",
        }
    }

    pub fn display_unit(&self) -> &'static str {
        match self {
            SoilVariable::Tsoi => "[\u{00B0}C]",
            SoilVariable::H2osoi => "[mm3/mm3]",
        }
    }

    /// Converts a stored value to the unit shown in time-series plots.
    pub fn to_display_unit(&self, value: f32) -> f32 {
        match self {
            SoilVariable::Tsoi => value - KELVIN_OFFSET,
            SoilVariable::H2osoi => value,
        }
    }

    pub fn quick_colormap(&self) -> Colormap {
        match self {
            SoilVariable::Tsoi => Colormap::yl_or_rd(),
            SoilVariable::H2osoi => Colormap::viridis(),
        }
    }

    pub fn timeseries_colormap(&self) -> Colormap {
        match self {
            SoilVariable::Tsoi => Colormap::yl_or_rd(),
            SoilVariable::H2osoi => Colormap::gist_earth_r().truncate(0.15, 0.9, 100),
        }
    }
}

impl fmt::Display for SoilVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn should_map_names() {
        assert_eq!(SoilVariable::from_name("TSOI"), Some(SoilVariable::Tsoi));
        assert_eq!(SoilVariable::from_name("H2OSOI"), Some(SoilVariable::H2osoi));
        assert_eq!(SoilVariable::from_name("QRUNOFF"), None);
        assert_eq!(SoilVariable::from_name("tsoi"), None);
        assert_eq!(SoilVariable::H2osoi.to_string(), "H2OSOI");
    }

    #[test]
    fn should_describe_depth_selection() {
        assert_eq!(SoilVariable::Tsoi.depth_dimension(), "levgrnd");
        assert_eq!(SoilVariable::Tsoi.level_range().len(), 9);
        assert_eq!(SoilVariable::H2osoi.depth_dimension(), "levsoi");
        assert_eq!(SoilVariable::H2osoi.level_range().len(), 15);
    }

    #[test]
    fn should_convert_kelvin_to_celsius() {
        assert_relative_eq!(SoilVariable::Tsoi.to_display_unit(273.15), 0.0);
        assert_relative_eq!(SoilVariable::Tsoi.to_display_unit(300.0), 26.85, epsilon = 1e-4);
        assert_relative_eq!(SoilVariable::H2osoi.to_display_unit(0.3), 0.3);
    }
}
