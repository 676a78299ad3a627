pub mod app;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod label;
pub mod listing;
pub mod output;
pub mod tree;
