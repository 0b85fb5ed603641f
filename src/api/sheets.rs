//! Google Sheets v4 client: values get/update/append, plus sheet (tab)
//! management through the batchUpdate endpoint.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

use super::check_response;

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Written values are parsed the way the Sheets UI would parse typed input
/// (numbers, dates, formulas).
const VALUE_INPUT_OPTION: &str = "USER_ENTERED";

#[derive(Debug, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct ValueRangeBody {
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateSummary {
    #[serde(rename = "updatedRange", default)]
    pub updated_range: Option<String>,
    #[serde(rename = "updatedCells", default)]
    pub updated_cells: Option<u32>,
    #[serde(rename = "updatedRows", default)]
    pub updated_rows: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AppendResponse {
    #[serde(default)]
    updates: Option<UpdateSummary>,
}

/// Properties of one sheet (tab) inside a spreadsheet.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetProperties {
    #[serde(rename = "sheetId")]
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: i64,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

pub struct SheetsClient {
    http: Client,
    token: String,
}

impl SheetsClient {
    pub fn new(http: Client, token: String) -> Self {
        Self { http, token }
    }

    /// Read a range of values (`A1` notation, optionally sheet-qualified).
    pub async fn values_get(&self, spreadsheet_id: &str, range: &str) -> Result<ValueRange> {
        let response = self
            .http
            .get(format!(
                "{}/{}/values/{}",
                SHEETS_BASE_URL,
                spreadsheet_id,
                urlencoding::encode(range)
            ))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Overwrite a range with the given rows.
    pub async fn values_update(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<UpdateSummary> {
        debug!(spreadsheet_id, range, "updating values");
        let response = self
            .http
            .put(format!(
                "{}/{}/values/{}",
                SHEETS_BASE_URL,
                spreadsheet_id,
                urlencoding::encode(range)
            ))
            .query(&[("valueInputOption", VALUE_INPUT_OPTION)])
            .bearer_auth(&self.token)
            .json(&ValueRangeBody { values: rows })
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Append rows after the last data row of the given table range.
    pub async fn values_append(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<UpdateSummary> {
        debug!(spreadsheet_id, range, rows = rows.len(), "appending rows");
        let response = self
            .http
            .post(format!(
                "{}/{}/values/{}:append",
                SHEETS_BASE_URL,
                spreadsheet_id,
                urlencoding::encode(range)
            ))
            .query(&[
                ("valueInputOption", VALUE_INPUT_OPTION),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(&self.token)
            .json(&ValueRangeBody { values: rows })
            .send()
            .await?;
        let response = check_response(response).await?;

        let parsed: AppendResponse = response.json().await?;
        Ok(parsed.updates.unwrap_or_default())
    }

    /// List the sheets (tabs) of a spreadsheet in display order.
    pub async fn list_sheets(&self, spreadsheet_id: &str) -> Result<Vec<SheetProperties>> {
        let response = self
            .http
            .get(format!("{}/{}", SHEETS_BASE_URL, spreadsheet_id))
            .query(&[("fields", "sheets.properties(sheetId,title,index)")])
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = check_response(response).await?;

        let meta: SpreadsheetMeta = response.json().await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties).collect())
    }

    /// Add a new sheet (tab) to the spreadsheet, returning its sheet ID.
    pub async fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> Result<Option<i64>> {
        let reply = self
            .batch_update(spreadsheet_id, add_sheet_request(title))
            .await?;
        Ok(reply_sheet_id(&reply, "addSheet"))
    }

    /// Delete a sheet (tab) by its numeric sheet ID.
    pub async fn delete_sheet(&self, spreadsheet_id: &str, sheet_id: i64) -> Result<()> {
        self.batch_update(spreadsheet_id, delete_sheet_request(sheet_id))
            .await?;
        Ok(())
    }

    /// Rename a sheet (tab) by its numeric sheet ID.
    pub async fn rename_sheet(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        title: &str,
    ) -> Result<()> {
        self.batch_update(spreadsheet_id, rename_sheet_request(sheet_id, title))
            .await?;
        Ok(())
    }

    /// Copy a sheet (tab) within the spreadsheet, returning the copy's ID.
    pub async fn duplicate_sheet(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        new_name: &str,
    ) -> Result<Option<i64>> {
        let reply = self
            .batch_update(spreadsheet_id, duplicate_sheet_request(sheet_id, new_name))
            .await?;
        Ok(reply_sheet_id(&reply, "duplicateSheet"))
    }

    async fn batch_update(
        &self,
        spreadsheet_id: &str,
        request: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let body = serde_json::json!({ "requests": [request] });
        debug!(spreadsheet_id, "sending batchUpdate");

        let response = self
            .http
            .post(format!("{}/{}:batchUpdate", SHEETS_BASE_URL, spreadsheet_id))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }
}

fn add_sheet_request(title: &str) -> serde_json::Value {
    serde_json::json!({ "addSheet": { "properties": { "title": title } } })
}

fn delete_sheet_request(sheet_id: i64) -> serde_json::Value {
    serde_json::json!({ "deleteSheet": { "sheetId": sheet_id } })
}

fn rename_sheet_request(sheet_id: i64, title: &str) -> serde_json::Value {
    serde_json::json!({
        "updateSheetProperties": {
            "properties": { "sheetId": sheet_id, "title": title },
            "fields": "title",
        }
    })
}

fn duplicate_sheet_request(sheet_id: i64, new_name: &str) -> serde_json::Value {
    serde_json::json!({
        "duplicateSheet": {
            "sourceSheetId": sheet_id,
            "insertSheetIndex": 0,
            "newSheetName": new_name,
        }
    })
}

/// Pull the resulting sheet ID out of a batchUpdate reply.
fn reply_sheet_id(reply: &serde_json::Value, kind: &str) -> Option<i64> {
    reply
        .get("replies")?
        .get(0)?
        .get(kind)?
        .get("properties")?
        .get("sheetId")?
        .as_i64()
}
