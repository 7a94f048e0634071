pub mod cache;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod filter;
pub mod github;
pub mod model;
pub mod pipeline;
pub mod plot;
pub mod rows;
pub mod stats;
pub mod util;
