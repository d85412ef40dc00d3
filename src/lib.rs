// src/lib.rs

//! Shinsho Feed Library
//!
//! Tracks the openBD catalog between runs and publishes newly registered
//! shinsho as an RSS feed.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
