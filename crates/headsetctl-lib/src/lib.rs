//! headsetctl: capability model, HID transport and feature dispatch for
//! USB and wireless gaming headsets.

pub mod batch;
pub mod battery;
pub mod capability;
pub mod config;
pub mod connection;
pub mod context;
pub mod device;
pub mod devices;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod hid;
pub mod params;
pub mod registry;
pub mod result;

pub use capability::{Capability, CapabilityKind, CapabilitySet};
pub use config::Config;
pub use device::HeadsetDevice;
pub use dispatch::{FeatureParam, FeatureResult, FeatureStatus};
pub use error::{DeviceError, ErrorKind, HeadsetError};
