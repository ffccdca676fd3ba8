//! Water-loss engine for the Rudaki district irrigation canals.
//!
//! Seepage along a fixed chain of canal segments is computed per 10-day
//! decade from measured tributary flows, then turned into decade volumes.
//! Individual channel records get measured-loss metrics and a status.

pub mod aggregate;
pub mod calendar;
pub mod coefficients;
pub mod config;
pub mod dataset;
pub mod error;
pub mod flows;
pub mod io;
pub mod metrics;
pub mod network;
pub mod routing;
pub mod seepage;
pub mod state;
pub mod summary;

pub use error::{LossError, Result};
pub use routing::{CalculatedTableResults, DecadeResult, LossCalculationResult, calculate_hydrology_table};
