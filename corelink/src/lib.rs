#![no_std]

pub use corelink_core::*;
pub use corelink_target::*;
