//! Strict receipt schema check, used when pass-through is disabled.

use chrono::NaiveDate;
use serde_json::Value;

use receiptforge_core::{ReceiptError, ReceiptRecord};

/// Require the four string fields and a real `YYYY-MM-DD` date.
pub fn validate_receipt(value: Value) -> Result<ReceiptRecord, ReceiptError> {
    let record: ReceiptRecord =
        serde_json::from_value(value).map_err(|e| ReceiptError::Validation(e.to_string()))?;

    let well_formed = record.date.len() == 10
        && NaiveDate::parse_from_str(&record.date, "%Y-%m-%d").is_ok();
    if !well_formed {
        return Err(ReceiptError::Validation(format!(
            "date `{}` is not a YYYY-MM-DD calendar date",
            record.date
        )));
    }

    Ok(record)
}
