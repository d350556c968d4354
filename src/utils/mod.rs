//! Utilities for Ghostclick.
//!
//! Submodules:
//! - `glide`: straight-line pointer paths used for short cursor relocations.
//! - `timing`: cancellation-aware sleeping and second/millisecond conversions.

pub mod glide;
pub mod timing;
