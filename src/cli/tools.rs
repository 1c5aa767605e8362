use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Attribute, Cell, Table};
use rmcp::model::Tool;
use serde_json::Value;

use crate::mcp::HarborMcp;

/// Required arguments first, optional ones in brackets
fn arguments(tool: &Tool) -> String {
    let schema = tool.input_schema.as_ref();
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut arguments: Vec<String> = required.iter().map(|name| name.to_string()).collect();
    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        arguments.extend(
            properties
                .keys()
                .filter(|name| !required.contains(&name.as_str()))
                .map(|name| format!("[{}]", name)),
        );
    }

    if arguments.is_empty() {
        "-".to_string()
    } else {
        arguments.join(", ")
    }
}

pub fn tools_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("TOOL").add_attribute(Attribute::Bold),
            Cell::new("DESCRIPTION").add_attribute(Attribute::Bold),
            Cell::new("ARGUMENTS").add_attribute(Attribute::Bold),
        ]);

    for tool in HarborMcp::catalogue() {
        table.add_row(vec![
            Cell::new(&tool.name),
            Cell::new(tool.description.as_deref().unwrap_or_default()),
            Cell::new(arguments(&tool)),
        ]);
    }

    table
}

pub fn print_tools() {
    println!("{}", tools_table());
}
