//! Shared helper functions for CLI commands.

use console::{measure_text_width, pad_str, style, Alignment};

use crate::batch::BatchRow;
use crate::extract::format_won;
use crate::models::{ResultStatus, SiteId};

/// Widest a free-text column may grow before it is truncated.
const MAX_COLUMN_WIDTH: usize = 40;

const HEADERS: [&str; 11] = [
    "#", "site", "status", "mode", "isbn", "title", "author", "publisher", "list", "sale",
    "remark",
];

/// Lets spreadsheet apps detect UTF-8 when opening the CSV.
const UTF8_BOM: &str = "\u{feff}";

/// Parse a `--disable` value.
pub fn parse_site(s: &str) -> Result<SiteId, String> {
    match SiteId::from_str(s) {
        Some(site) if site != SiteId::Unknown => Ok(site),
        _ => Err(format!(
            "unknown store '{}' (expected one of: yes24, aladin, kyobo, ypbooks)",
            s
        )),
    }
}

/// URLs from a list file: one per line, blank lines and `#` comments skipped.
pub fn parse_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

fn price_cell(price: Option<u64>) -> String {
    price.map(format_won).unwrap_or_default()
}

/// Error text and duplicate note share the last column.
fn remark_cell(row: &BatchRow) -> String {
    match (&row.record.error, &row.note) {
        (Some(error), Some(note)) => format!("{} / {}", error, note),
        (Some(error), None) => error.clone(),
        (None, Some(note)) => note.clone(),
        (None, None) => String::new(),
    }
}

/// Display cells for one row, in `HEADERS` order. `index` is 0-based.
fn row_cells(index: usize, row: &BatchRow) -> [String; 11] {
    let r = &row.record;
    [
        (index + 1).to_string(),
        r.site.to_string(),
        r.status.as_str().to_string(),
        r.parse_mode.as_str().to_string(),
        r.isbn.clone().unwrap_or_default(),
        r.title.clone().unwrap_or_default(),
        r.author.clone().unwrap_or_default(),
        r.publisher.clone().unwrap_or_default(),
        price_cell(r.list_price),
        price_cell(r.sale_price),
        remark_cell(row),
    ]
}

/// Render rows as a plain, column-aligned table.
pub fn render_table(rows: &[BatchRow]) -> String {
    let cells: Vec<[String; 11]> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| row_cells(i, row))
        .collect();

    let mut widths = HEADERS.map(measure_text_width);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(measure_text_width(cell));
        }
    }
    // The remark column is last, so it is never padded or cut.
    for width in widths.iter_mut().take(HEADERS.len() - 1) {
        *width = (*width).min(MAX_COLUMN_WIDTH);
    }

    let line = |row: &[&str]| -> String {
        let last = row.len() - 1;
        row.iter()
            .enumerate()
            .map(|(i, cell)| {
                if i == last {
                    cell.to_string()
                } else {
                    let align = if i >= 8 { Alignment::Right } else { Alignment::Left };
                    pad_str(cell, widths[i], align, Some("…")).into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(&HEADERS[..]));
    out.push('\n');
    for row in &cells {
        let refs: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&line(&refs));
        out.push('\n');
    }
    out
}

/// Render rows as CSV with a UTF-8 BOM, columns as in the table.
pub fn render_csv(rows: &[BatchRow]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.as_bytes().to_vec());
    writer.write_record(HEADERS)?;
    for (i, row) in rows.iter().enumerate() {
        writer.write_record(row_cells(i, row))?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// One-line tally printed after the table.
pub fn summary_line(rows: &[BatchRow]) -> String {
    let count = |status: ResultStatus| rows.iter().filter(|r| r.record.status == status).count();
    format!(
        "{} {} succeeded, {} {} failed, {} {} skipped",
        style("✓").green(),
        count(ResultStatus::Success),
        style("✗").red(),
        count(ResultStatus::Failed),
        style("○").dim(),
        count(ResultStatus::Skipped),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchAccumulator;
    use crate::models::{ParseMode, ResultRecord};

    #[test]
    fn test_parse_site() {
        assert_eq!(parse_site("kyobo"), Ok(SiteId::Kyobo));
        assert_eq!(parse_site("YES24"), Ok(SiteId::Yes24));
        assert!(parse_site("unknown").is_err());
        assert!(parse_site("amazon").is_err());
    }

    #[test]
    fn test_parse_url_list_skips_blanks_and_comments() {
        let contents = "# weekly list\nhttps://www.yes24.com/Product/Goods/1\n\n   \n  https://www.aladin.co.kr/shop/wproduct.aspx?ItemId=2  \n#https://example.com\n";
        assert_eq!(
            parse_url_list(contents),
            vec![
                "https://www.yes24.com/Product/Goods/1".to_string(),
                "https://www.aladin.co.kr/shop/wproduct.aspx?ItemId=2".to_string(),
            ]
        );
    }

    #[test]
    fn test_render_table() {
        let mut acc = BatchAccumulator::new();
        let mut record = ResultRecord::parsed(
            SiteId::Yes24,
            "https://www.yes24.com/Product/Goods/1",
            Some("1".into()),
            ParseMode::Static,
        );
        record.status = ResultStatus::Success;
        record.isbn = Some("9788936434120".into());
        record.title = Some("소년이 온다".into());
        record.list_price = Some(15000);
        record.sale_price = Some(13500);
        acc.push(record.clone());
        acc.push(record);
        acc.push(ResultRecord::unsupported("https://example.com/x"));

        let table = render_table(acc.rows());
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("#  site"));
        assert!(lines[1].contains("소년이 온다"));
        assert!(lines[1].contains("15,000"));
        assert!(lines[1].contains("13,500"));
        assert!(lines[2].ends_with("중복 ISBN (이전 행 1)"));
        assert!(lines[3].contains("UNKNOWN"));
    }

    #[test]
    fn test_render_csv() {
        let mut acc = BatchAccumulator::new();
        let mut record = ResultRecord::parsed(
            SiteId::Kyobo,
            "https://product.kyobobook.co.kr/detail/S000001234567",
            Some("S000001234567".into()),
            ParseMode::Rendered,
        );
        record.status = ResultStatus::Success;
        record.isbn = Some("9788936434120".into());
        record.title = Some("소년이 온다".into());
        record.author = Some("한강".into());
        record.list_price = Some(15000);
        record.sale_price = Some(13500);
        acc.push(record.clone());
        acc.push(record);

        let csv = render_csv(acc.rows()).unwrap();
        assert!(csv.starts_with('\u{feff}'));

        let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "#,site,status,mode,isbn,title,author,publisher,list,sale,remark"
        );
        assert_eq!(
            lines[1],
            r#"1,KYOBO,success,rendered,9788936434120,소년이 온다,한강,,"15,000","13,500","#
        );
        assert!(lines[2].ends_with(",중복 ISBN (이전 행 1)"));
    }

    #[test]
    fn test_summary_counts() {
        let mut acc = BatchAccumulator::new();
        acc.push(ResultRecord::skipped(SiteId::Kyobo, "u"));
        acc.push(ResultRecord::unsupported("v"));
        let summary = console::strip_ansi_codes(&summary_line(acc.rows())).into_owned();
        assert_eq!(summary, "✓ 0 succeeded, ✗ 1 failed, ○ 1 skipped");
    }
}
