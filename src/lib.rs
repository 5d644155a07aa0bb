//! Single-day shift scheduling as a mixed-integer program.
//!
//! A roster of employees and an hourly customer curve are turned into a
//! linear model, solved by an ILP backend, and read back as one contiguous
//! shift per employee with per-hour coverage.
//!
//! # Pipeline
//!
//! - [`demand`]: customers per hour -> staff required per hour
//! - [`model`]: work/start binaries, staff counts, shortage and surplus
//! - [`objective`]: minimize cost or maximize coverage
//! - [`ilp`]: solver-agnostic program plus the `good_lp`/microlp backend
//! - [`extract`]: variable values -> [`ScheduleResult`](extract::ScheduleResult)
//! - [`optimizer`]: the above, run once per problem
//!
//! [`solver`] runs jobs in the background and [`api`] serves them over HTTP.

pub mod api;
pub mod config;
pub mod console;
pub mod demand;
pub mod demo_data;
pub mod domain;
pub mod dto;
pub mod error;
pub mod extract;
pub mod ilp;
pub mod model;
pub mod objective;
pub mod optimizer;
pub mod solver;
