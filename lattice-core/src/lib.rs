//! Lattice Core
//!
//! Core types shared by the Lattice compute-grid node and its server client.
//!
//! This crate contains:
//! - Domain types: jobs, job results and structured log records
//! - DTOs: request/response shapes exchanged with the job server

pub mod domain;
pub mod dto;
