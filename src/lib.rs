//! Accord - Multi-Party Amendment Workflow Orchestration Engine
//!
//! This crate implements a resumable state machine that drives a proposed
//! amendment through party evaluation, conflict detection, mediated
//! negotiation, optional specialized review, and final consolidation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
