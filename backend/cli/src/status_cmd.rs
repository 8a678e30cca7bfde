//! CLI Status Command
//!
//! Prints the health report of a gateway running on this machine.

use anyhow::Result;

pub async fn run(port: u16) -> Result<()> {
    let client = reqwest::Client::new();
    match client
        .get(format!("http://127.0.0.1:{port}/api/health"))
        .send()
        .await
    {
        Ok(resp) => {
            let body: serde_json::Value = resp.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Err(_) => {
            println!("ReceiptForge is not running on port {port}");
        }
    }
    Ok(())
}
