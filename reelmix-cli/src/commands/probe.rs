//! Implementation of the 'probe' subcommand.

use crate::cli::ProbeArgs;
use crate::error::CliResult;

use reelmix_core::external::{MediaDimensions, ProcessRunner, ToolPaths};
use reelmix_core::{CoreError, MediaProbe, RunContext, check_dependency, format_duration};

use console::style;

fn dimension_note(dims: &MediaDimensions) -> &'static str {
    if dims.is_even() {
        "even"
    } else {
        "odd, will be re-encoded before splitting"
    }
}

pub fn run_probe(args: ProbeArgs) -> CliResult<()> {
    if !args.file.is_file() {
        return Err(CoreError::PathError(format!(
            "File not found: {}",
            args.file.display()
        )));
    }

    let tools = ToolPaths::resolve();
    check_dependency(&tools.ffprobe)?;

    let runner = ProcessRunner::new();
    let ctx = RunContext::new();
    let probe = MediaProbe::new(&runner, &tools);
    let duration = probe.duration(&args.file, &ctx)?;
    let dims = probe.dimensions(&args.file, &ctx)?;

    println!("{}", style(args.file.display()).bold());
    println!(
        "  {} {} ({:.2}s)",
        style("Duration:").bold(),
        format_duration(duration),
        duration
    );
    println!(
        "  {} {}x{} ({})",
        style("Dimensions:").bold(),
        dims.width,
        dims.height,
        dimension_note(&dims)
    );
    Ok(())
}
