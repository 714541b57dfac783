pub mod api;
pub mod config;
pub mod extractor;
pub mod humanize;
pub mod jobs;
pub mod observability;
pub mod watch;
pub mod worker;
