//! Gateway domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operational status of a gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStatus {
    Active,
    #[default]
    Inactive,
    Maintenance,
}

impl GatewayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayStatus::Active => "active",
            GatewayStatus::Inactive => "inactive",
            GatewayStatus::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GatewayStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(GatewayStatus::Active),
            "inactive" => Ok(GatewayStatus::Inactive),
            "maintenance" => Ok(GatewayStatus::Maintenance),
            other => Err(format!("Unknown gateway status: {}", other)),
        }
    }
}

/// A gateway aggregating a set of devices, optionally owned by a seller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gateway {
    pub id: Uuid,
    pub name: String,
    pub status: GatewayStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub max_devices: i32,
    pub seller_id: Option<Uuid>,
}
