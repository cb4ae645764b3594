//! NBA margin prediction and bet selection.
//!
//! Completed games flow through the team-state accumulator into feature rows,
//! a ridge pipeline predicts the home margin, and the bet selector turns the
//! prediction plus consensus market odds into one recommendation per game.

pub mod api;
pub mod betting;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod matching;
pub mod model;
pub mod models;
pub mod services;
pub mod workers;

pub use error::{Error, Result};
