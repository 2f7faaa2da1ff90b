//! # Oracle Node Runtime
//!
//! The deployable validator node. Wires the consensus crate
//! (leader selection, response resolution, thresholds), the dispatch crate
//! (per-chain submission engines) and the scheduler (locked periodic jobs)
//! into one process driven by a JSON configuration file.
//!
//! ```text
//!   scheduler tick
//!        │
//!   RoundJob: leader? ──no──> idle
//!        │ yes
//!   propose ──> collect responses ──> resolve per chain ──> threshold gate
//!                                                                │
//!                              DispatchCoordinator <─────────────┘
//!                                    │
//!                      one DispatchEngine per active chain
//! ```
//!
//! The library exposes the wiring ([`container`]) so deployments can plug
//! in real chain adapters; the shipped binary runs the devnet simulation.

pub mod adapters;
pub mod config;
pub mod container;
pub mod jobs;

pub use config::{ConfigError, NodeConfig};
pub use container::{build_devnet, ChainPorts, NodeContainer, NodePorts};
