// SPDX-License-Identifier: MIT

//! Agent development kit: the reasoning loop and the seams it plugs into

pub mod agent;
pub mod error;
pub mod memory;
pub mod model;
pub mod registry;
pub mod tool;
