//! Protocol module for encoding and decoding beacon payloads.
//!
//! This module contains the implementations for:
//! - Beacon frame encoding and decoding
//! - Scan filter construction and matching

pub mod filter;
pub mod frame;

pub use filter::ScanFilterSpec;
pub use frame::{BeaconFrame, DecodeError};
