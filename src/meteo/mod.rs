// SPDX-License-Identifier: MIT

//! Weather domain: configuration, live data sources and sessions

pub mod config;
pub mod http;
pub mod session;
pub mod tools;
