pub mod probe;

pub use probe::{check_status, StatusProbe, StatusResult};
