use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ExtractArgs;
use crate::commands::report::build_merged_table;
use crate::commands::report::pdf_text::read_source;
use crate::model::{ExtractResponse, ExtractionStats, REPORT_COLUMNS, Record};

pub fn run(args: ExtractArgs) -> Result<()> {
    let source = read_source(&args.source)?;
    let table = build_merged_table(&source.text)?;

    info!(input = %source.label, rows = table.rows.len(), "extract completed");

    let stdout = io::stdout();
    let mut output = io::BufWriter::new(stdout.lock());
    if args.json {
        write_json_table(&mut output, &table.rows, &table.stats)?;
    } else {
        write_text_table(&mut output, &table.rows)?;
    }
    output.flush()?;

    Ok(())
}

fn write_json_table<W: Write>(
    output: &mut W,
    rows: &[Record],
    stats: &ExtractionStats,
) -> Result<()> {
    let response = ExtractResponse {
        columns: REPORT_COLUMNS,
        stats,
        rows,
    };

    serde_json::to_writer_pretty(&mut *output, &response)
        .context("failed to serialize extract json output")?;
    writeln!(output)?;
    Ok(())
}

fn write_text_table<W: Write>(output: &mut W, rows: &[Record]) -> Result<()> {
    writeln!(output, "{}", REPORT_COLUMNS.join("\t"))?;
    for record in rows {
        writeln!(output, "{}", record.cells().join("\t"))?;
    }
    Ok(())
}
