//! Simulation core: energy balance, pricing, projection and KPIs.

/// Monthly energy balance and the battery transfer model.
pub mod balance;
/// Upfront cost model.
pub mod capex;
pub mod engine;
pub mod finance;
/// NPV and the internal-rate-of-return solver.
pub mod irr;
pub mod types;
