//! Candidate Evaluation Service
//!
//! This library provides the core of the cv-evaluator system: an in-memory
//! job registry that evaluates a candidate's CV and project report against a
//! job title in the background, using a generative language model with
//! bounded retries, and exposes the results over HTTP.

pub mod app_state;
pub mod config;
pub mod errors;
pub mod models;
pub mod routes;
pub mod services;
pub mod telemetry;
