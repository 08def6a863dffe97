//! Core library components.
//!
//! This module contains the reusable logic for driving the `op` binary:
//! locating it, building and running commands, managing sign-in state and
//! decoding output into typed records.

pub mod account;
pub mod client;
pub mod command;
pub mod config;
pub mod constants;
pub mod decode;
pub mod domain;
pub mod exec;
pub mod locate;
pub mod prompt;
pub mod session;
