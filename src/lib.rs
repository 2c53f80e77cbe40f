//! Lucky draw spinner library
//!
//! An animated number-lottery page: spinning digit cards, a particle
//! fireworks overlay on every reveal, synthesized sound cues and local
//! persistence of settings, history and favourites.

pub mod audio;
pub mod config;
pub mod constants;
pub mod error;
pub mod fireworks;
pub mod graphics;
pub mod lottery;
pub mod storage;
pub mod ui;
