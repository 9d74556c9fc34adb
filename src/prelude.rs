pub use crate::error::SirError;
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::model::{SirModel, SirState};
pub use crate::parameters::{Parameters, Preset};
pub use crate::report::ReportOptions;
pub use crate::trajectory::{EpidemicSummary, Trajectory};
pub use crate::{assert_almost_eq, euler, reference};
