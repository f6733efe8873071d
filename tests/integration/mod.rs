// tests/integration/mod.rs
//! Integration tests for vista-sync
//!
//! These drive the sync engine and the snapshot export end to end: HTTP
//! through reqwest to a wiremock server, rows into the in-memory store.

#[cfg(test)]
mod fake_vista;

#[cfg(test)]
mod full_sync;

#[cfg(test)]
mod snapshot_export;

#[cfg(test)]
mod postgrest_store;
