//! Block device driver for HyperBus NOR flash (HyperFlash).
//!
//! [`HyperFlashBlockDevice`] exposes the flash array past a reserved
//! region as a fixed-geometry block device: bounded reads, page-chunked
//! programs and sector erases, each mutating step followed by a bounded
//! status poll. The bus is injected through the [`HyperBus`] trait and the
//! poll interval through [`embedded_hal::delay::DelayNs`].
//!
//! # Features
//!
//! - `defmt`: log through `defmt`
//! - `log`: log through the `log` facade
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod chunk;
pub mod comms;
pub mod config;
pub mod device;
pub mod error;
pub mod geometry;
pub mod storage;
pub mod traits;

pub use comms::{HyperFlash, Status};
pub use config::{Config, Timing};
pub use device::HyperFlashBlockDevice;
pub use error::{Error, ParameterError};
pub use geometry::Geometry;
pub use traits::{AccessClass, BlockDevice, HyperBus};
