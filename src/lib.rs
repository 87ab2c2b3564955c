//! Wait time report for simulated emergency department (SOR) patients.
//!
//! The crate reads a `Priority,WaitTime` dataset, aggregates it per priority, draws two PNG charts
//! and lays everything out in an A4 PDF.  [`pipeline::run`] ties the steps together;
//! [`simulation`] produces a dataset to feed it.

pub mod builder;
pub mod charts;
pub mod config;
pub mod dataset;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod simulation;
pub mod stats;
pub mod text;

pub use config::ReportConfig;
pub use error::{RenderError, ReportError, Result};
pub use pipeline::{run, ReportSummary};
pub use simulation::{simulate, SimulationConfig, SimulationOutcome};
