//! HTTP polling surface
//!
//! `POST /download` submits, `GET /status/{download_id}` polls. Health and
//! counters live under `/health` and `/operators/*`.

mod error;
pub mod models;
mod server;
pub mod services;
pub mod state;
pub(crate) mod utils;

pub use error::ApiError;
pub use server::{router, run};
