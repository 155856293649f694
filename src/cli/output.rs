/// Terminal output helpers shared by the commands
use colored::*;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};

/// Print a warning message
pub fn print_warning(message: &str) {
    println!(
        "\n{} {}",
        "⚠".yellow(),
        format!("Warning: {}", message).yellow()
    );
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("\n{} {}", "✓".green().bold(), message);
}

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{} {}", "▶".cyan(), title.bold());
    println!("{}", "─".repeat(60).dimmed());
}

fn styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Print a two-column table under a title header
pub fn print_stats_table(title: &str, stats: Vec<(String, String)>) {
    let mut table = styled_table();
    table.set_header(vec![
        Cell::new(title)
            .add_attribute(Attribute::Bold)
            .fg(TableColor::Cyan),
        Cell::new("").add_attribute(Attribute::Bold),
    ]);

    for (label, value) in stats {
        table.add_row(vec![Cell::new(label), Cell::new(value).fg(TableColor::Green)]);
    }

    println!("\n{}", table);
}

/// Print rows under column headers
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = styled_table();
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold).fg(TableColor::Cyan))
            .collect::<Vec<_>>(),
    );
    for row in rows {
        table.add_row(row);
    }
    println!("\n{}", table);
}

/// Print formatted number with thousands separator
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
