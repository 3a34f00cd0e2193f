//! Gateway entity (database row mapping).

use domain::models::GatewayStatus;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the gateways table.
#[derive(Debug, Clone, FromRow)]
pub struct GatewayEntity {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub max_devices: i32,
    pub seller_id: Option<Uuid>,
}

impl From<GatewayEntity> for domain::models::Gateway {
    fn from(entity: GatewayEntity) -> Self {
        let status = entity.status.parse().unwrap_or_else(|_| {
            tracing::warn!(
                gateway_id = %entity.id,
                status = %entity.status,
                "Unknown gateway status, treating as inactive"
            );
            GatewayStatus::Inactive
        });

        Self {
            id: entity.id,
            name: entity.name,
            status,
            latitude: entity.latitude,
            longitude: entity.longitude,
            max_devices: entity.max_devices,
            seller_id: entity.seller_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(status: &str) -> GatewayEntity {
        GatewayEntity {
            id: Uuid::new_v4(),
            name: "North block".to_string(),
            status: status.to_string(),
            latitude: Some(12.97),
            longitude: Some(77.59),
            max_devices: 32,
            seller_id: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn test_gateway_entity_to_domain() {
        let gateway: domain::models::Gateway = entity("maintenance").into();
        assert_eq!(gateway.status, GatewayStatus::Maintenance);
        assert_eq!(gateway.max_devices, 32);
    }

    #[test]
    fn test_unknown_status_becomes_inactive() {
        let gateway: domain::models::Gateway = entity("decommissioned").into();
        assert_eq!(gateway.status, GatewayStatus::Inactive);
    }
}
