//! Soil profile rendering.

pub mod colormap;
pub mod contour;
pub mod figure;
pub mod profile;
mod text;

pub use figure::Figure;
pub use profile::{quick_profile_figure, timeseries_figure};
