pub mod case;
pub mod report;
