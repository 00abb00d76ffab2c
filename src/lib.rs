// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Club-Leaderboard: a Strava club leaderboard with duplicate resolution
//!
//! This crate ingests activity records from the Strava API and from manual
//! imports, decides for each incoming record whether it re-observes an
//! activity that is already stored, and folds the deduplicated record set
//! into per-athlete leaderboard summaries.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;
