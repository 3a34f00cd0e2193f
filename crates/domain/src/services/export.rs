//! CSV earnings report for one seller and month.

use chrono::{NaiveDate, Utc};
use csv::{Terminator, WriterBuilder};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::money::format_amount;
use shared::period::MonthKey;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::earnings::{EarningsError, EarningsService};
use crate::models::{Seller, SellerTopology, Subscription};

const REPORT_HEADERS: [&str; 13] = [
    "Date",
    "Device ID",
    "Device Name",
    "Customer Name",
    "Customer Phone",
    "Customer Email",
    "Plan Name",
    "Plan Type",
    "Recharge Amount",
    "Commission Amount",
    "Payment Status",
    "Valid From",
    "Valid Until",
];

const DATE_FORMAT: &str = "%d/%m/%Y";
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Error)]
enum RenderError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Report is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Whether the export holds a report or an error document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ExportOutcome {
    Complete { rows: usize },
    Failed { message: String },
}

/// A rendered CSV report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
    pub outcome: ExportOutcome,
}

impl CsvExport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ExportOutcome::Failed { .. })
    }
}

/// `earnings_report_<YYYY-MM>.csv`, or `earnings_report_current.csv`.
pub fn report_filename(month: Option<MonthKey>) -> String {
    match month {
        Some(month) => format!("earnings_report_{}.csv", month),
        None => "earnings_report_current.csv".to_string(),
    }
}

impl EarningsService {
    /// Detailed CSV report of the month's completed recharges with a summary
    /// block. Fetch failures produce an error document rather than an error.
    pub async fn export_csv(
        &self,
        seller_id: Option<Uuid>,
        month: Option<MonthKey>,
    ) -> Result<CsvExport, EarningsError> {
        let seller_id = seller_id.ok_or(EarningsError::SellerIdRequired)?;
        let filename = report_filename(month);
        let period = month.unwrap_or_else(MonthKey::current);

        let loaded = self
            .with_timeout_limit(async {
                let topology = self.resolve_topology(Some(seller_id)).await?;
                let seller = self.store().find_seller(seller_id).await?;
                let rate = self.resolve_commission_rate(seller.as_ref()).await?;
                let subscriptions = self.query_window(&topology.device_ids(), period).await?;
                Ok::<_, EarningsError>((topology, seller, rate, subscriptions))
            })
            .await;

        let rendered = match loaded {
            Ok((topology, seller, rate, subscriptions)) => self
                .render_report(&topology, seller.as_ref(), rate, &subscriptions, period)
                .map(|content| (content, subscriptions.len()))
                .map_err(|e| e.to_string()),
            Err(err) => Err(err.to_string()),
        };

        match rendered {
            Ok((content, rows)) => {
                info!(seller_id = %seller_id, month = %period, rows, "Exported earnings report");
                Ok(CsvExport {
                    filename,
                    content,
                    outcome: ExportOutcome::Complete { rows },
                })
            }
            Err(message) => {
                warn!(
                    seller_id = %seller_id,
                    month = %period,
                    error = %message,
                    "Earnings export failed"
                );
                Ok(CsvExport {
                    filename,
                    content: error_document(&message),
                    outcome: ExportOutcome::Failed { message },
                })
            }
        }
    }

    fn render_report(
        &self,
        topology: &SellerTopology,
        seller: Option<&Seller>,
        rate: Decimal,
        subscriptions: &[Subscription],
        period: MonthKey,
    ) -> Result<String, RenderError> {
        let lookup = topology.device_lookup();
        let mut total_amount = Decimal::ZERO;
        let mut total_commission = Decimal::ZERO;

        let mut wtr = WriterBuilder::new()
            .flexible(true)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(vec![]);
        wtr.write_record(REPORT_HEADERS)?;

        let text = |value: Option<&String>| {
            value
                .cloned()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };

        for sub in subscriptions {
            let device = lookup.get(sub.device_id.as_str());
            let commission = self.policy().commission_for(sub, rate);
            total_amount += sub.amount;
            total_commission += commission;

            wtr.write_record([
                sub.valid_from.format(DATE_FORMAT).to_string(),
                sub.device_id.clone(),
                text(device.and_then(|d| d.device_name.as_ref())),
                device
                    .and_then(|d| d.customer_name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                text(device.and_then(|d| d.customer_phone.as_ref())),
                text(device.and_then(|d| d.customer_email.as_ref())),
                sub.plan_name_or_default().to_string(),
                sub.plan_type.clone().unwrap_or_else(|| "Unknown".to_string()),
                format_amount(sub.amount),
                format_amount(commission),
                sub.payment_status.to_string(),
                sub.valid_from.format(DATE_FORMAT).to_string(),
                sub.valid_until.format(DATE_FORMAT).to_string(),
            ])?;
        }

        let mut buf = wtr.into_inner().map_err(|e| e.into_error())?;
        buf.push(b'\n');

        let contact = |field: fn(&Seller) -> Option<&String>| {
            seller
                .and_then(field)
                .cloned()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        let today: NaiveDate = Utc::now().date_naive();

        let mut wtr = WriterBuilder::new()
            .flexible(true)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(buf);
        wtr.write_record(["Summary"])?;
        wtr.write_record(["Total Transactions".to_string(), subscriptions.len().to_string()])?;
        wtr.write_record(["Total Recharge Amount".to_string(), format_amount(total_amount)])?;
        wtr.write_record([
            "Total Commission Earned".to_string(),
            format_amount(total_commission),
        ])?;
        wtr.write_record([
            "Business Name".to_string(),
            seller
                .map(|s| s.business_name_or_default().to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ])?;
        wtr.write_record(["Seller Name".to_string(), contact(|s| s.full_name.as_ref())])?;
        wtr.write_record(["Seller Email".to_string(), contact(|s| s.email.as_ref())])?;
        wtr.write_record(["Seller Phone".to_string(), contact(|s| s.phone.as_ref())])?;
        wtr.write_record(["Report Period".to_string(), period.to_string()])?;
        wtr.write_record(["Generated On".to_string(), today.format(DATE_FORMAT).to_string()])?;

        let buf = wtr.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(buf)?)
    }
}

fn error_document(message: &str) -> String {
    let mut wtr = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(vec![]);
    let written = wtr
        .write_record(["Error", message])
        .ok()
        .and_then(|_| wtr.into_inner().ok())
        .and_then(|buf| String::from_utf8(buf).ok());
    written.unwrap_or_else(|| "Error,export failed\n".to_string())
}
