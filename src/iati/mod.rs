//! IATI scraper - functional pipeline from d-portal queries to HDX datasets

pub mod assemble;
pub mod config;
pub mod countries;
pub mod dates;
pub mod fetch;
pub mod parse;
pub mod publish;
pub mod query;
pub mod run;
pub mod types;
pub mod utils;

pub use types::*;
