//! Device domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A motor controller installed at a customer site.
///
/// `id` is the internal row key; `device_id` is the external identifier that
/// subscriptions reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: Uuid,
    pub device_id: String,
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub motor_status: i32,
    pub error_status: i32,
    pub installation_date: Option<NaiveDate>,
    pub last_updated: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub gateway_id: Option<Uuid>,
}

impl Device {
    pub fn is_running(&self) -> bool {
        self.motor_status != 0
    }

    pub fn has_error(&self) -> bool {
        self.error_status != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(motor_status: i32, error_status: i32) -> Device {
        Device {
            id: Uuid::new_v4(),
            device_id: "WM-0001".to_string(),
            device_name: Some("Pump house".to_string()),
            device_type: None,
            motor_status,
            error_status,
            installation_date: None,
            last_updated: None,
            customer_name: None,
            customer_phone: None,
            customer_email: None,
            gateway_id: None,
        }
    }

    #[test]
    fn test_motor_flags() {
        assert!(device(1, 0).is_running());
        assert!(!device(0, 0).is_running());
        assert!(device(0, 3).has_error());
        assert!(!device(1, 0).has_error());
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let json = serde_json::to_string(&device(1, 0)).unwrap();
        assert!(json.contains("\"deviceId\":\"WM-0001\""));
        assert!(json.contains("\"motorStatus\":1"));
    }
}
