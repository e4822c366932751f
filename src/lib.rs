//! Deoptscope - timeline model and state derivation for V8 optimization traces
//!
//! This library holds, per function and per inline-cache site, the ordered
//! history of compilation, deoptimization and IC events recorded in a V8
//! trace, and derives the summary state used to rank entries: a function's
//! current tier (or `mixed` when it was optimized more than once) and an IC
//! site's worst observed state.
//!
//! Entries are ingested once through [`log::LogBuilder`] (or a JSON
//! [`log::LogSnapshot`]) and frozen into a [`log::Log`]; every derived
//! getter is cached on first use.

pub mod cli;
pub mod config;
pub mod function_entry;
pub mod history;
pub mod history_uri;
pub mod ic_entry;
pub mod log;
pub mod position;
pub mod reference;
pub mod report;
pub mod session;
pub mod v8;
