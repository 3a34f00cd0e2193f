//! Seller hardware topology: gateways and the devices behind them.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::device::Device;

/// The gateways a seller owns and the devices attached to them.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerTopology {
    pub seller_id: Option<Uuid>,
    pub gateway_ids: Vec<Uuid>,
    pub devices: Vec<Device>,
}

impl SellerTopology {
    /// A topology with no gateways or devices.
    pub fn empty(seller_id: Option<Uuid>) -> Self {
        Self {
            seller_id,
            gateway_ids: Vec::new(),
            devices: Vec::new(),
        }
    }

    /// External device identifiers, used to join subscriptions.
    pub fn device_ids(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.device_id.clone()).collect()
    }

    pub fn has_devices(&self) -> bool {
        !self.devices.is_empty()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Lookup from external device id to device.
    pub fn device_lookup(&self) -> HashMap<&str, &Device> {
        self.devices
            .iter()
            .map(|d| (d.device_id.as_str(), d))
            .collect()
    }
}
