use airtable_http::{ActionRequest, AirtableClient, QueryParams};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_id = std::env::var("AIRTABLE_BASE_ID")?;
    let table = std::env::var("AIRTABLE_TABLE").unwrap_or_else(|_| "Tasks".to_owned());

    let client = AirtableClient::from_env()?;
    let base = client.base(base_id);

    base.dispatch(&ActionRequest::post(
        format!("/{table}"),
        json!({ "records": [{ "fields": { "Name": "Kit" } }] }),
    ))
    .await?;

    let response = base
        .dispatch(&ActionRequest::get(format!("/{table}")).with_query(
            QueryParams::new()
                .with("maxRecords", "10")
                .with("fields[]", ["Name"]),
        ))
        .await?;

    if let Some(records) = response.body.as_ref().and_then(|body| body.get("records")) {
        for record in records.as_array().into_iter().flatten() {
            println!("{record}");
        }
    }

    Ok(())
}
