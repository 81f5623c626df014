pub mod control;
pub mod dashboard;
