use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use pgframe::{DataFrame, Value};

/// Render a frame as a terminal table.
pub fn render_table(frame: &DataFrame) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            frame
                .column_names()
                .into_iter()
                .map(|name| Cell::new(name).add_attribute(Attribute::Bold).fg(Color::Cyan)),
        );

    for row in frame.rows() {
        table.add_row(row.into_iter().map(cell));
    }

    table.to_string()
}

fn cell(value: &Value) -> Cell {
    if value.is_null() {
        Cell::new("(null)").fg(Color::DarkGrey)
    } else if value.is_numeric() {
        Cell::new(value.to_string()).fg(Color::Yellow)
    } else {
        Cell::new(value.to_string())
    }
}

/// Render a frame as a pretty-printed JSON array of objects.
pub fn render_json(frame: &DataFrame) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&frame.to_json_records())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new()
            .with_column("id", [1, 2])
            .unwrap()
            .with_column("name", [Some("Toyota"), None])
            .unwrap()
    }

    #[test]
    fn table_shows_headers_and_nulls() {
        let out = render_table(&frame());
        assert!(out.contains("id"));
        assert!(out.contains("Toyota"));
        assert!(out.contains("(null)"));
    }

    #[test]
    fn json_keeps_column_order() {
        let out = render_json(&frame()).unwrap();
        let id = out.find("\"id\"").unwrap();
        let name = out.find("\"name\"").unwrap();
        assert!(id < name);
        assert!(out.contains("null"));
    }
}
