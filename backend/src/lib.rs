//! # Pack On My Back track backend
//!
//! Merges GPX uploads from several devices into one chronologically placed,
//! down-sampled track per juncture (a leg of a trip) and stores it as
//! coordinate rows. The backend exposes a REST API via Axum for the web
//! client.
//!
//! ## Architecture
//!
//! - [`tracks`]: the merge and decimation engine plus statement rendering
//! - [`api`]: GeoJSON payloads exchanged with the client
//! - [`services`]: temporary upload storage and the ingestion pipeline
//! - [`db`]: repository pattern and persistence backends
//! - [`config`]: server settings from the environment
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod services;
pub mod tracks;

#[cfg(feature = "http-server")]
pub mod http;
