//! HTML table parsing

use crate::extract::normalize_whitespace;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Largest `colspan`/`rowspan` honoured; larger values are clamped
const MAX_SPAN: usize = 1000;

/// A parsed HTML table
///
/// The first row of the source table provides the column names. Every row
/// holds exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// (number of rows, number of columns), header excluded
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// Values of the named column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map_or("", String::as_str))
                .collect(),
        )
    }

    /// Renders the table as a markdown pipe table
    pub fn to_markdown(&self) -> String {
        render_markdown(&self.columns, &self.rows)
    }
}

/// Parses a `<table>` element
///
/// Returns the parsed table and its markdown rendering. The markdown keeps
/// the header cells as written, while [`Table::columns`] are made unique:
/// blank names become `Unnamed: {index}` and repeats get a `.{n}` suffix.
/// `colspan` and `rowspan` cells are repeated into every slot they cover,
/// and short rows are padded with empty cells.
pub fn parse_table(table: ElementRef<'_>) -> (Table, String) {
    let mut grid = expand_spans(&owned_rows(table));

    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut grid {
        row.resize(width, String::new());
    }

    let mut rows = grid.into_iter();
    let header = rows.next().unwrap_or_default();
    let body: Vec<Vec<String>> = rows.collect();

    let markdown = render_markdown(&header, &body);
    let table = Table {
        columns: column_names(&header),
        rows: body,
    };

    (table, markdown)
}

/// Rows belonging to `table` itself, not to tables nested inside it
fn owned_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let Ok(row_selector) = Selector::parse("tr") else {
        return Vec::new();
    };

    table
        .select(&row_selector)
        .filter(|row| {
            row.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|ancestor| ancestor.value().name() == "table")
                .map(|owner| owner.id())
                == Some(table.id())
        })
        .collect()
}

/// Lays the rows out on a grid, repeating spanned cells
fn expand_spans(rows: &[ElementRef<'_>]) -> Vec<Vec<String>> {
    // column -> (rows still covered, text)
    let mut carried: BTreeMap<usize, (usize, String)> = BTreeMap::new();
    let mut grid = Vec::with_capacity(rows.len());

    for row in rows {
        let mut cells = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| matches!(cell.value().name(), "td" | "th"));
        let mut out = Vec::new();
        let mut col = 0;

        loop {
            if let Some(text) = take_carried(&mut carried, col) {
                out.push(text);
                col += 1;
                continue;
            }

            let Some(cell) = cells.next() else {
                // Out of cells: still place rowspans carried further right
                let Some(next) = carried.range(col..).next().map(|(&c, _)| c) else {
                    break;
                };
                while col < next {
                    out.push(String::new());
                    col += 1;
                }
                continue;
            };

            let text = normalize_whitespace(&cell.text().collect::<String>());
            let colspan = span(cell, "colspan");
            let rowspan = span(cell, "rowspan");

            for _ in 0..colspan {
                if rowspan > 1 {
                    carried.insert(col, (rowspan - 1, text.clone()));
                }
                out.push(text.clone());
                col += 1;
            }
        }

        grid.push(out);
    }

    grid
}

fn take_carried(carried: &mut BTreeMap<usize, (usize, String)>, col: usize) -> Option<String> {
    let (remaining, text) = carried.get_mut(&col)?;
    let text = text.clone();
    *remaining -= 1;
    if *remaining == 0 {
        carried.remove(&col);
    }
    Some(text)
}

fn span(cell: ElementRef<'_>, attribute: &str) -> usize {
    cell.value()
        .attr(attribute)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
        .min(MAX_SPAN)
}

fn column_names(header: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    header
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let name = if name.is_empty() {
                format!("Unnamed: {}", index)
            } else {
                name.clone()
            };

            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{}.{}", name, count)
            };
            *count += 1;
            unique
        })
        .collect()
}

fn render_markdown(header: &[String], rows: &[Vec<String>]) -> String {
    if header.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(markdown_row(header));
    lines.push(markdown_row(&vec!["---".to_string(); header.len()]));
    lines.extend(rows.iter().map(|row| markdown_row(row)));
    lines.join("\n")
}

fn markdown_row(cells: &[String]) -> String {
    let escaped: Vec<String> = cells.iter().map(|c| c.replace('|', "\\|")).collect();
    format!("| {} |", escaped.join(" | "))
}
