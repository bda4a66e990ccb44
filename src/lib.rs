//! implant-plan: dental implant catalog lookup and surgical planning
//!
//! Looks up implants in a CSV reference catalog, keeps a validated per-tooth
//! plan for one session, and renders it as a surgical drilling protocol.

pub mod cli;
pub mod core;
pub mod report;
