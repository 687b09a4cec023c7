use anyhow::{Context, Result, anyhow};
use tracing::info_span;

use nsqip_cli::extract::{ExportRequest, describe, export};
use nsqip_model::ColumnType;
use nsqip_query::{Mode, OpenOptions};

use crate::cli::{DescribeArgs, ExportArgs, ModeArg};
use crate::summary::{print_describe, print_export};

pub fn run_describe(args: &DescribeArgs) -> Result<()> {
    let options = open_options(&args.numeric_overrides)?;
    let span = info_span!("describe", dir = %args.dir.display());
    let _guard = span.enter();

    let report = describe(&args.dir, mode_of(args.mode), &options)
        .with_context(|| format!("describe {}", args.dir.display()))?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&report).context("serialize report")?;
        println!("{rendered}");
    } else {
        print_describe(&report);
    }
    Ok(())
}

pub fn run_export(args: &ExportArgs) -> Result<()> {
    let options = open_options(&args.numeric_overrides)?;
    let span = info_span!(
        "export",
        dir = %args.dir.display(),
        output = %args.output.display()
    );
    let _guard = span.enter();

    let request = ExportRequest {
        dir: args.dir.clone(),
        output: args.output.clone(),
        years: args.years.clone(),
        cpt: args.cpt.clone(),
        diagnosis: args.diagnosis.clone(),
        columns: args.columns.clone(),
        options,
    };
    let report = export(&request).with_context(|| format!("export {}", args.dir.display()))?;
    print_export(&report);
    Ok(())
}

fn mode_of(arg: ModeArg) -> Mode {
    match arg {
        ModeArg::Eager => Mode::Eager,
        ModeArg::Lazy => Mode::Lazy,
    }
}

/// Parse repeated `COLUMN=TYPE` override flags into open options.
fn open_options(overrides: &[String]) -> Result<OpenOptions> {
    let mut options = OpenOptions::default();
    for entry in overrides {
        let (column, target) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid override {entry:?}, expected COLUMN=TYPE"))?;
        let target: ColumnType = target
            .trim()
            .parse()
            .map_err(|message: String| anyhow!("invalid override {entry:?}: {message}"))?;
        options = options.with_numeric_override(column.trim(), target);
    }
    Ok(options)
}
