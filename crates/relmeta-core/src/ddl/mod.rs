//! DDL generation.

mod generator;
mod quoting;

pub use generator::DdlGenerator;
pub use quoting::Quoter;
