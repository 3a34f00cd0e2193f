//! Device entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the devices table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceEntity {
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

impl From<DeviceEntity> for domain::models::Device {
    fn from(entity: DeviceEntity) -> Self {
        Self {
            id: entity.id,
            device_id: entity.device_id,
            device_name: entity.device_name,
            device_type: entity.device_type,
            motor_status: entity.motor_status,
            error_status: entity.error_status,
            installation_date: entity.installation_date,
            last_updated: entity.last_updated,
            customer_name: entity.customer_name,
            customer_phone: entity.customer_phone,
            customer_email: entity.customer_email,
            gateway_id: entity.gateway_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_entity_to_domain() {
        let entity = DeviceEntity {
            id: Uuid::new_v4(),
            device_id: "WM-1042".to_string(),
            device_name: Some("Terrace pump".to_string()),
            device_type: Some("water_motor".to_string()),
            motor_status: 1,
            error_status: 0,
            installation_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            last_updated: Some(Utc::now()),
            customer_name: Some("Ravi".to_string()),
            customer_phone: None,
            customer_email: None,
            gateway_id: Some(Uuid::new_v4()),
        };

        let device: domain::models::Device = entity.clone().into();

        assert_eq!(device.id, entity.id);
        assert_eq!(device.device_id, "WM-1042");
        assert!(device.is_running());
        assert!(!device.has_error());
        assert_eq!(device.gateway_id, entity.gateway_id);
    }
}
