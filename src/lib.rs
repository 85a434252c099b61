//! # devparams
//!
//! Device parameters service: the device's geographical position, and what is
//! derived from it (timezone, country, daily sunrise and sunset), the device name,
//! and a clock device emitting a time event every minute.
//!
//! ## Architecture
//!
//! - **Service**: [`parameters::Parameters`] implements every operation over
//!   injected collaborators (settings store, time source, command runner, event sink)
//! - **Commands**: [`commands`] maps host JSON requests and CLI subcommands onto the
//!   service
//! - **Geographic**: [`geo`] computes sun times, timezone and country from coordinates
//! - **Clock**: [`clock`] decides what each minute tick emits; [`daemon`] drives it
//! - **Configuration**: [`config`] for the TOML settings file
//! - **System**: [`system`] and [`hostname`] apply changes to the host
//! - **Infrastructure**: signal handling, lock file and logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod clock;
pub mod commands;
pub mod config;
pub mod constants;
pub mod daemon;
pub mod error;
pub mod events;
pub mod geo;
pub mod hostname;
pub mod io;
pub mod parameters;
pub mod system;
pub mod time_source;

pub use error::ParameterError;
pub use parameters::Parameters;
