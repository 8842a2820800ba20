pub mod dataset;
pub mod files;
pub mod time;
pub mod variable;

pub use dataset::{load_profile, LoadMode, SoilProfile};
pub use files::{find_simulation_files, FilePattern, Stream};
pub use time::TimeFix;
pub use variable::SoilVariable;
