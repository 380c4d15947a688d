// src/lib.rs

#![doc = "Pin lookup for STM32CubeMX MCU device description files."]
#![doc = ""]
#![doc = "A CubeMX `Mcu` file lists every pin of a package as"]
#![doc = "`<Pin Name=\"PC13\" Position=\"2\" Type=\"I/O\">`. This crate indexes those"]
#![doc = "elements once and answers lookups in both directions:"]
#![doc = "- `DeviceDescriptor::pin_number_for_name`: `\"PB12\"` -> `33`."]
#![doc = "- `DeviceDescriptor::pin_name_for_number`: `33` -> `\"PB12\"`."]
#![doc = ""]
#![doc = "Load failures are reported as a `DescriptorError` whose `kind()` is one"]
#![doc = "of three stable classes, each with its own process exit code."]

// --- Crate Modules ---

mod descriptor;
mod error;
mod model;
mod parser;
mod types;

// --- Public API Re-exports ---

pub use descriptor::{DeviceDescriptor, LoadPolicy};
pub use error::{DescriptorError, ErrorKind};
pub use types::{IntoPinNumber, McuInfo, Pin, PinMatch};
