//! `drivekit sheets` - spreadsheet operations.

use anyhow::Result;
use regex::Regex;

use crate::api::{self, SheetsClient};
use crate::auth::{self, SHEETS_SCOPE};
use crate::config::Settings;
use crate::error::Error;

async fn sheets_client(settings: &Settings) -> Result<SheetsClient> {
    let http = api::http_client()?;
    let resolver = auth::google_resolver(settings, &[SHEETS_SCOPE]);
    let token = auth::bearer_token(&http, &resolver).await?;
    Ok(SheetsClient::new(http, token))
}

pub async fn get(settings: &Settings, range: &str, spreadsheet: Option<String>) -> Result<()> {
    let spreadsheet_id = settings.spreadsheet(spreadsheet)?;
    let client = sheets_client(settings).await?;
    let values = client.values_get(&spreadsheet_id, range).await?;

    if values.values.is_empty() {
        println!("(empty range)");
        return Ok(());
    }
    for row in &values.values {
        let cells: Vec<String> = row.iter().map(render_cell).collect();
        println!("{}", cells.join("\t"));
    }
    Ok(())
}

pub async fn write(
    settings: &Settings,
    cell: &str,
    value: &str,
    spreadsheet: Option<String>,
) -> Result<()> {
    let spreadsheet_id = settings.spreadsheet(spreadsheet)?;
    let client = sheets_client(settings).await?;
    let summary = client
        .values_update(&spreadsheet_id, cell, vec![vec![value.to_string()]])
        .await?;

    println!(
        "Wrote {} (updated {} cell(s))",
        summary.updated_range.as_deref().unwrap_or(cell),
        summary.updated_cells.unwrap_or(1)
    );
    Ok(())
}

pub async fn append(
    settings: &Settings,
    values: Vec<String>,
    sheet: &str,
    spreadsheet: Option<String>,
) -> Result<()> {
    let spreadsheet_id = settings.spreadsheet(spreadsheet)?;
    let client = sheets_client(settings).await?;

    // Appending against the sheet's A1 anchor makes the API locate the table
    let range = format!("{}!A1", sheet);
    let summary = client
        .values_append(&spreadsheet_id, &range, vec![values])
        .await?;

    println!(
        "Appended {} row(s) at {}",
        summary.updated_rows.unwrap_or(1),
        summary.updated_range.as_deref().unwrap_or(sheet)
    );
    Ok(())
}

pub async fn add_sheet(
    settings: &Settings,
    title: &str,
    spreadsheet: Option<String>,
) -> Result<()> {
    let spreadsheet_id = settings.spreadsheet(spreadsheet)?;
    let client = sheets_client(settings).await?;
    let sheet_id = client.add_sheet(&spreadsheet_id, title).await?;

    match sheet_id {
        Some(id) => println!("Added sheet '{}' (sheetId: {})", title, id),
        None => println!("Added sheet '{}'", title),
    }
    Ok(())
}

pub async fn list_sheets(settings: &Settings, spreadsheet: Option<String>) -> Result<()> {
    let spreadsheet_id = settings.spreadsheet(spreadsheet)?;
    let client = sheets_client(settings).await?;
    let sheets = client.list_sheets(&spreadsheet_id).await?;

    for props in &sheets {
        println!("{:>12}  {}", props.sheet_id, props.title);
    }
    println!("{} sheet(s)", sheets.len());
    Ok(())
}

pub async fn delete_sheet(
    settings: &Settings,
    sheet_id: i64,
    spreadsheet: Option<String>,
) -> Result<()> {
    let spreadsheet_id = settings.spreadsheet(spreadsheet)?;
    let client = sheets_client(settings).await?;
    client.delete_sheet(&spreadsheet_id, sheet_id).await?;

    println!("Deleted sheet {}", sheet_id);
    Ok(())
}

pub async fn rename_sheet(
    settings: &Settings,
    sheet_id: i64,
    title: &str,
    spreadsheet: Option<String>,
) -> Result<()> {
    let spreadsheet_id = settings.spreadsheet(spreadsheet)?;
    let client = sheets_client(settings).await?;
    client.rename_sheet(&spreadsheet_id, sheet_id, title).await?;

    println!("Renamed sheet {} to '{}'", sheet_id, title);
    Ok(())
}

pub async fn duplicate_sheet(
    settings: &Settings,
    sheet_id: i64,
    title: &str,
    spreadsheet: Option<String>,
) -> Result<()> {
    let spreadsheet_id = settings.spreadsheet(spreadsheet)?;
    let client = sheets_client(settings).await?;
    let new_id = client
        .duplicate_sheet(&spreadsheet_id, sheet_id, title)
        .await?;

    match new_id {
        Some(id) => println!("Duplicated sheet {} as '{}' (sheetId: {})", sheet_id, title, id),
        None => println!("Duplicated sheet {} as '{}'", sheet_id, title),
    }
    Ok(())
}

pub async fn search(
    settings: &Settings,
    value: Option<String>,
    pattern: Option<String>,
    column: Option<String>,
    sheet: &str,
    spreadsheet: Option<String>,
) -> Result<()> {
    let matcher = Matcher::build(value, pattern)?;
    let column_index = column.as_deref().map(column_letter_to_index).transpose()?;

    let spreadsheet_id = settings.spreadsheet(spreadsheet)?;
    let client = sheets_client(settings).await?;
    // A bare sheet name addresses the whole sheet
    let values = client.values_get(&spreadsheet_id, sheet).await?;

    let rows: Vec<Vec<String>> = values
        .values
        .iter()
        .map(|row| row.iter().map(render_cell).collect())
        .collect();
    let hits = match_rows(&rows, column_index, &matcher);

    if hits.is_empty() {
        println!("No matching rows.");
        return Ok(());
    }
    for (row_number, row) in &hits {
        println!("Row {}: {}", row_number, row.join("\t"));
    }
    println!("{} matching row(s)", hits.len());
    Ok(())
}

/// How a search compares against a cell value.
enum Matcher {
    Substring(String),
    Pattern(Regex),
}

impl Matcher {
    fn build(value: Option<String>, pattern: Option<String>) -> Result<Self, Error> {
        match (value, pattern) {
            (Some(v), None) => Ok(Matcher::Substring(v)),
            (None, Some(p)) => {
                let regex = Regex::new(&p)
                    .map_err(|e| Error::Config(format!("invalid search pattern: {}", e)))?;
                Ok(Matcher::Pattern(regex))
            }
            _ => Err(Error::Config(
                "give exactly one of --value or --pattern".to_string(),
            )),
        }
    }

    fn matches(&self, cell: &str) -> bool {
        match self {
            Matcher::Substring(needle) => cell.contains(needle),
            Matcher::Pattern(regex) => regex.is_match(cell),
        }
    }
}

/// Rows whose cells match, paired with their 1-based row number. With a
/// column index only that cell is tested; otherwise any cell in the row.
fn match_rows<'a>(
    rows: &'a [Vec<String>],
    column: Option<usize>,
    matcher: &Matcher,
) -> Vec<(usize, &'a Vec<String>)> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| match column {
            Some(idx) => row.get(idx).is_some_and(|cell| matcher.matches(cell)),
            None => row.iter().any(|cell| matcher.matches(cell)),
        })
        .map(|(i, row)| (i + 1, row))
        .collect()
}

/// Convert a column letter ("A", "C", "AA") to a zero-based index.
fn column_letter_to_index(letter: &str) -> Result<usize, Error> {
    if letter.is_empty() || !letter.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::Config(format!(
            "invalid column letter '{}'",
            letter
        )));
    }
    let mut index = 0usize;
    for c in letter.chars() {
        index = index * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Ok(index - 1)
}

fn render_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_cell_strings_unquoted() {
        assert_eq!(render_cell(&serde_json::json!("apples")), "apples");
        assert_eq!(render_cell(&serde_json::json!(3)), "3");
        assert_eq!(render_cell(&serde_json::json!(2.5)), "2.5");
    }

    #[test]
    fn test_column_letter_to_index() {
        assert_eq!(column_letter_to_index("A").unwrap(), 0);
        assert_eq!(column_letter_to_index("c").unwrap(), 2);
        assert_eq!(column_letter_to_index("Z").unwrap(), 25);
        assert_eq!(column_letter_to_index("AA").unwrap(), 26);
        assert!(column_letter_to_index("").is_err());
        assert!(column_letter_to_index("A1").is_err());
    }

    #[test]
    fn test_matcher_requires_exactly_one_criterion() {
        assert!(Matcher::build(None, None).is_err());
        assert!(Matcher::build(Some("a".into()), Some("b".into())).is_err());
        assert!(Matcher::build(Some("a".into()), None).is_ok());
        assert!(Matcher::build(None, Some("^a".into())).is_ok());
        assert!(Matcher::build(None, Some("[".into())).is_err());
    }

    fn sample_rows() -> Vec<Vec<String>> {
        vec![
            vec!["Name".into(), "Count".into()],
            vec!["apples".into(), "3".into()],
            vec!["pears".into(), "12".into()],
        ]
    }

    #[test]
    fn test_match_rows_substring_any_column() {
        let rows = sample_rows();
        let matcher = Matcher::Substring("apple".into());
        let hits = match_rows(&rows, None, &matcher);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 2); // row numbers are 1-based
    }

    #[test]
    fn test_match_rows_restricted_to_column() {
        let rows = sample_rows();
        let matcher = Matcher::Substring("1".into());
        // column B: only "12" contains "1"
        let hits = match_rows(&rows, Some(1), &matcher);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 3);
        // a column past the row's width never matches
        assert!(match_rows(&rows, Some(9), &matcher).is_empty());
    }

    #[test]
    fn test_match_rows_regex() {
        let rows = sample_rows();
        let matcher = Matcher::Pattern(Regex::new(r"^\d{2}$").unwrap());
        let hits = match_rows(&rows, None, &matcher);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 3);
    }
}
