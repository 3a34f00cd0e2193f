//! Fixtures shared by the service tests.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::store::MemoryEarningsStore;
use crate::models::{Device, Gateway, GatewayStatus, PaymentStatus, Seller, Subscription};

/// A seller owning one gateway with devices `D1` and `D2`.
pub struct Fixture {
    pub store: Arc<MemoryEarningsStore>,
    pub seller_id: Uuid,
    pub gateway_id: Uuid,
}

pub fn fixture() -> Fixture {
    let store = Arc::new(MemoryEarningsStore::new());
    let seller_id = Uuid::new_v4();
    let gateway_id = Uuid::new_v4();

    store.insert_seller(seller(seller_id));
    store.insert_gateway(Gateway {
        id: gateway_id,
        name: "Gateway North".to_string(),
        status: GatewayStatus::Active,
        latitude: Some(12.97),
        longitude: Some(77.59),
        max_devices: 16,
        seller_id: Some(seller_id),
    });
    store.insert_device(device("D1", gateway_id));
    store.insert_device(device("D2", gateway_id));

    Fixture {
        store,
        seller_id,
        gateway_id,
    }
}

pub fn seller(id: Uuid) -> Seller {
    Seller {
        id,
        business_name: Some("Aqua Motors".to_string()),
        commission_rate: None,
        total_sales: Decimal::ZERO,
        is_approved: true,
        is_active: true,
        full_name: Some(Name().fake()),
        email: Some(SafeEmail().fake()),
        phone: Some(PhoneNumber().fake()),
        created_at: Utc::now(),
    }
}

pub fn device(external_id: &str, gateway_id: Uuid) -> Device {
    Device {
        id: Uuid::new_v4(),
        device_id: external_id.to_string(),
        device_name: Some(format!("Motor {}", external_id)),
        device_type: Some("water_motor".to_string()),
        motor_status: 1,
        error_status: 0,
        installation_date: None,
        last_updated: None,
        customer_name: Some(Name().fake()),
        customer_phone: Some(PhoneNumber().fake()),
        customer_email: Some(SafeEmail().fake()),
        gateway_id: Some(gateway_id),
    }
}

/// A completed subscription starting at 10:00 UTC on the given day.
pub fn subscription_in(
    device_id: &str,
    year: i32,
    month: u32,
    day: u32,
    amount: &str,
    commission: Option<&str>,
    seller_id: Option<Uuid>,
) -> Subscription {
    let valid_from = Utc
        .with_ymd_and_hms(year, month, day, 10, 0, 0)
        .single()
        .expect("valid fixture date");
    Subscription {
        id: Uuid::new_v4(),
        device_id: device_id.to_string(),
        amount: Decimal::from_str(amount).expect("valid fixture amount"),
        commission_amount: commission.map(|c| Decimal::from_str(c).expect("valid commission")),
        payment_status: PaymentStatus::Completed,
        plan_name: Some("Monthly Basic".to_string()),
        plan_type: Some("monthly_basic".to_string()),
        valid_from,
        valid_until: valid_from + Duration::days(30),
        seller_id,
    }
}
