#![cfg_attr(not(test), no_std)]
//! Shared contract types and Bitcoin SPV utilities for the DelayCover contracts.

pub mod spv;
pub mod types;
