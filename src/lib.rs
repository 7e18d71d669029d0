pub mod clean;
pub mod model;
pub mod report;
pub mod sink;
pub mod source;
