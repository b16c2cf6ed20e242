use super::{DeviceSel, SX1261_PROFILE, SX1262_PROFILE, SX1268_PROFILE};
use crate::profile::ChipProfile;

/// Implement this trait on your custom variant or use provided impls
pub trait Sx126xVariant {
    /// whether to use high or low power PA
    fn get_device_sel(&self) -> DeviceSel;

    /// Static description of the part
    fn profile(&self) -> &'static ChipProfile;

    /// use dio2 as rf switch output
    fn use_dio2_as_rfswitch(&self) -> bool {
        true
    }
}

/// Sx1261 uses only LowPowerPA
pub struct Sx1261;

impl Sx126xVariant for Sx1261 {
    fn get_device_sel(&self) -> DeviceSel {
        DeviceSel::LowPowerPA
    }

    fn profile(&self) -> &'static ChipProfile {
        &SX1261_PROFILE
    }
}

/// Sx1262 uses only HighPowerPA
pub struct Sx1262;

impl Sx126xVariant for Sx1262 {
    fn get_device_sel(&self) -> DeviceSel {
        DeviceSel::HighPowerPA
    }

    fn profile(&self) -> &'static ChipProfile {
        &SX1262_PROFILE
    }
}

/// Sx1268, the 410 to 810 MHz high power part
pub struct Sx1268;

impl Sx126xVariant for Sx1268 {
    fn get_device_sel(&self) -> DeviceSel {
        DeviceSel::HighPowerPA
    }

    fn profile(&self) -> &'static ChipProfile {
        &SX1268_PROFILE
    }
}
