use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use nsqip_cli::extract::{DescribeReport, ExportReport};

pub fn print_describe(report: &DescribeReport) {
    println!("Dataset: {}", report.dir.display());
    println!(
        "Kind: {}   Mode: {}   Rows: {}",
        report.kind, report.mode, report.rows
    );

    let mut sources = Table::new();
    sources.set_header(vec![
        header_cell("Source"),
        header_cell("Format"),
        header_cell("File"),
    ]);
    apply_table_style(&mut sources);
    for spec in &report.sources {
        sources.add_row(vec![
            Cell::new(spec.id.as_str())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(spec.format),
            Cell::new(spec.path.display()),
        ]);
    }
    println!("{sources}");

    let mut schema = Table::new();
    schema.set_header(vec![
        header_cell("Column"),
        header_cell("Type"),
        header_cell("Nullable"),
    ]);
    apply_table_style(&mut schema);
    align_column(&mut schema, 2, CellAlignment::Center);
    for spec in &report.columns {
        schema.add_row(vec![
            Cell::new(&spec.name),
            Cell::new(spec.declared_type.as_str()),
            nullable_cell(spec.nullable),
        ]);
    }
    println!("{schema}");
}

pub fn print_export(report: &ExportReport) {
    println!(
        "Wrote {} rows x {} columns to {} ({})",
        report.rows,
        report.columns,
        report.output.display(),
        report.format
    );
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn nullable_cell(nullable: bool) -> Cell {
    if nullable {
        Cell::new("yes").fg(Color::Yellow)
    } else {
        Cell::new("-").fg(Color::DarkGrey)
    }
}
