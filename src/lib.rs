pub mod aggregate;
pub mod app;
pub mod cbioportal;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod output;
pub mod table;
