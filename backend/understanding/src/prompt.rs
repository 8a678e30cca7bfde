//! Instruction prompt for receipt extraction.

use chrono::{NaiveDate, Utc};

/// Build the extraction prompt, naming `today` as the fallback date.
pub fn build_receipt_prompt(today: NaiveDate) -> String {
    format!(
        r#"Analyze this receipt image and extract the following information in JSON format:
- date: The date of the transaction (YYYY-MM-DD format). If it cannot be determined, use today's date ({today}).
- name: The name of the store or vendor. Simplify it if it is too long.
- currency: The currency symbol or code (e.g., ¥, $, JPY).
- amount: The total amount paid. Remove commas.

Example output:
{{
  "date": "2023-10-27",
  "name": "SevenEleven",
  "currency": "¥",
  "amount": "1200"
}}

Only return the JSON object, no markdown code blocks."#,
        today = today.format("%Y-%m-%d")
    )
}

/// Prompt for the current UTC date.
pub fn receipt_prompt_for_today() -> String {
    build_receipt_prompt(Utc::now().date_naive())
}
