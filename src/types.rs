pub mod alert;
pub mod display;
pub mod traits;

pub use alert::{AlertRequest, AlertResult, CourseSectionAlert, RawAlerts, HTTP_CODE_UNAVAILABLE};
pub use display::{DisplayModel, DisplayRow, IconKind};
pub use traits::Widget;
