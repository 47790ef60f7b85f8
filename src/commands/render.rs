use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::RenderArgs;
use crate::commands::report::build_merged_table;
use crate::commands::report::colors::KitColorMap;
use crate::commands::report::pdf_text::read_source;
use crate::commands::report::render::{PageLayout, render_report};
use crate::model::ReportRunManifest;
use crate::util::{default_report_path, now_utc_string, write_json_pretty};

const MANIFEST_VERSION: u32 = 1;

pub fn run(args: RenderArgs) -> Result<()> {
    let output = args.output.clone().unwrap_or_else(default_report_path);
    let colors = KitColorMap::from_pairs(args.kits.iter().cloned());

    info!(
        input = %args.source.input.display(),
        output = %output.display(),
        kit_colors = colors.len(),
        "starting report render"
    );
    if colors.is_empty() {
        warn!("no kit colors given; every row renders on white");
    }

    let source = read_source(&args.source)?;
    let table = build_merged_table(&source.text)?;

    let pages = render_report(
        &table.rows,
        &colors,
        args.title.as_deref(),
        &output,
        &PageLayout::default(),
    )
    .context("failed to render report")?;

    if let Some(manifest_path) = &args.manifest_path {
        let manifest = ReportRunManifest {
            manifest_version: MANIFEST_VERSION,
            generated_at: now_utc_string(),
            input_path: source.label.clone(),
            input_sha256: source.sha256.clone(),
            output_path: output.display().to_string(),
            from_text: args.source.from_text,
            stats: table.stats.clone(),
            kit_colors: colors.entries(),
        };
        write_json_pretty(manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote run manifest");
    }

    info!(
        path = %output.display(),
        rows = table.rows.len(),
        pages,
        "report completed"
    );

    Ok(())
}
