// SPDX-License-Identifier: MIT

//! Conversational weather agent built on a ReAct reasoning loop

pub mod adk;
pub mod meteo;
