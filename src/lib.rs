//! sunwatch library
//!
//! Fetches sunshine data for weather stations and keeps it fresh: a
//! [`orchestrator::FetchOrchestrator`] applies a request timeout, retries
//! transient failures with exponential backoff, refreshes silently in the
//! background and substitutes synthetic series when nothing has been fetched.

pub mod cache;
pub mod cli;
pub mod data;
pub mod error;
pub mod fallback;
pub mod insights;
pub mod orchestrator;
pub mod provider;
pub mod refresh;
pub mod report;
