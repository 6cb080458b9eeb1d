pub mod errors;
pub mod file_info;
pub mod ids;
pub mod plan;
pub mod report;

pub use errors::*;
pub use file_info::*;
pub use ids::*;
pub use plan::*;
pub use report::*;
