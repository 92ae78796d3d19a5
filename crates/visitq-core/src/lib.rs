//! visitq-core
//!
//! Deferred link-visit queue: accepts links from chat owners, holds them
//! until they are due, resolves each one through an external resolver under
//! a bounded permit pool, records the outcome and tells the owner.
//!
//! # Modules
//! - **domain**: data model (ids, queue items, events, proxy attempts, devices, owners, errors)
//! - **ports**: seams to storage, resolver, chat, user directory, ids and time
//! - **impls**: in-memory store, device catalog, blocking-resolver adapter, local doubles
//! - **app**: intake, planner, scheduler, reaper, orchestrator, notifier, builder
//! - **config**: TOML service configuration
//! - **observability**: queue status counts

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

#[cfg(test)]
mod testkit;
