//! # Topogen - Topology and traffic generation for point-to-point network simulations
//!
//! This library turns an adjacency matrix and a coordinate list into a
//! provisioned point-to-point network, drives randomized traffic flows across
//! it and samples egress queue occupancy over simulated time.
//!
//! ## Overview
//!
//! Packet transmission, queuing disciplines and routing are left to an external
//! simulator. Topogen describes what it needs from that simulator through the
//! [`substrate::Substrate`] and [`substrate::Kernel`] traits and ships an
//! in-memory implementation of both for dry runs and tests.
//!
//! ## Key Features
//!
//! - **Validated Inputs**: Square 0/1 adjacency matrices and (x, y) coordinate lists
//! - **Deterministic Links**: Row-major link construction, one /24 per link
//! - **Link Classes**: Endpoint-Relay and Relay-Relay rates with a shared delay
//! - **Randomized Flows**: Per-interval pairings where no endpoint is used twice
//! - **Monitoring**: Periodic max-queue samples and a drop-ratio time series
//! - **Reproducible**: Seeded flow scheduling, the seed is always logged
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `config`: Type-safe configuration structures and validation
//! - `config_loader`: Configuration file loading and CLI overrides
//! - `matrix_reader`: Adjacency matrix and coordinate file parsing
//! - `ip`: Subnet allocation and address ownership
//! - `topology`: Node, link and device construction
//! - `traffic`: Flow scheduling and sink descriptors
//! - `monitor`: Queue-length and drop-ratio probes and their reports
//! - `substrate`: Simulator interface, in-memory substrate and event loop
//! - `utils`: Data rates, simulated time and matrix inspection
//! - `orchestrator`: High-level orchestration of a complete run
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use topogen::{config_loader, orchestrator};
//!
//! // Load configuration from YAML file
//! let config = config_loader::load_config(Path::new("topogen.yaml"))?;
//!
//! // Build, run and write the artifacts
//! let summary = orchestrator::generate(&config, Path::new("topogen_output"))?;
//! println!("{} links, {} flows", summary.link_count, summary.flow_count);
//!
//! // The topogen_output directory now contains:
//! // - topology.json: nodes, links, devices and addresses
//! // - flows.json: the seed, sinks and the flow plan
//! // - monitor.json: queue and drop-ratio samples
//! # Ok::<(), color_eyre::Report>(())
//! ```
//!
//! ## Configuration Format
//!
//! Every section is optional and falls back to its defaults:
//!
//! ```yaml
//! general:
//!   stop_time: "120s"
//!   seed: 42
//!   log_level: info
//!
//! inputs:
//!   adjacency_matrix: "scratch/adjacency_matrix.txt"
//!   node_coordinates: "scratch/node_coordinates.txt"
//!
//! nodes:
//!   endpoints: 50
//!   relays: 30
//!
//! links:
//!   endpoint_relay_rate: "10Mbps"
//!   relay_relay_rate: "0.5Mbps"
//!   delay: "2ms"
//!   queue_capacity: 100000
//!   error_rate: 0.0
//!
//! traffic:
//!   decision_interval: "100ms"
//!   port: 9
//!   packet_size: 210
//!   packet_interval: "3750us"
//!   max_packets: 1000
//!
//! monitor:
//!   queue_interval: "200ms"
//!   drop_report_every: 100
//! ```
//!
//! ## Error Handling
//!
//! Module level errors are `thiserror` enums. The orchestrator and the binary
//! use `color_eyre` for error reporting with context.

pub mod config;
pub mod config_loader;
pub mod matrix_reader;

pub mod ip;
pub mod topology;
pub mod traffic;
pub mod monitor;
pub mod substrate;
pub mod utils;
pub mod orchestrator;
