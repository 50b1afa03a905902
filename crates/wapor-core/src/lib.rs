//! WaPOR Core - Client for the FAO WaPOR GIS Manager API
//!
//! This crate contains the session handling, catalog resolution, availability
//! queries and job polling used to pull WaPOR rasters and time series.

pub mod availability;
pub mod catalog;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod http;
pub mod jobs;
pub mod models;
pub mod ports;
pub mod products;
pub mod session;

pub use client::{ClientOptions, WaporClient};
pub use error::{Result, WaporError};
