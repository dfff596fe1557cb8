#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod ai;
mod common;
mod config;
mod game;
mod grid;
#[cfg(feature = "std")]
mod ledger;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
mod notify;
mod placement;
mod player;
#[cfg(feature = "std")]
mod service;
mod ship;
mod simulate;
#[cfg(feature = "std")]
mod store;
#[cfg(feature = "std")]
pub mod ui;

pub use ai::{next_shot, probability_map, ProbabilityMap, TargetMode};
pub use common::*;
pub use config::*;
pub use game::*;
pub use grid::*;
#[cfg(feature = "std")]
pub use ledger::*;
#[cfg(feature = "std")]
pub use logging::init_logging;
#[cfg(feature = "std")]
pub use notify::*;
pub use placement::*;
pub use player::*;
#[cfg(feature = "std")]
pub use service::*;
pub use ship::*;
pub use simulate::*;
#[cfg(feature = "std")]
pub use store::*;
