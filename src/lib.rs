//! JourneyDash - patient-journey analytics queue.
//!
//! A persisted queue of healthcare analytics requests with change
//! notifications, a demo progress simulator, a chat assistant backed by the
//! Gemini API (with canned offline answers), and a static patient-journey
//! rule knowledge base.

pub mod assistant;
pub mod cli;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod knowledge;
pub mod models;
pub mod state;
