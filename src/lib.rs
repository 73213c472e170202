//! Residential photovoltaic sizing and profitability engine.

#[cfg(feature = "api")]
pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod io;
pub mod optimizer;
pub mod request;
pub mod response;
pub mod runner;
pub mod scenario;
/// Monthly balance, capex, projection, and KPI modules.
pub mod sim;
