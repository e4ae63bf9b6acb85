// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for Beacon mirror clients (config, prefs,
//! diagnostic log). Keeps transport/render adapters thin and framework-agnostic.

pub mod config;
pub mod diag_log;
pub mod prefs;
