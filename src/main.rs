use anyhow::Result;
use clap::Parser;
use recuento::{cli::Cli, pipeline, resolver::SourcePriority};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = pipeline::PipelineConfig {
        quantity_type: args.quantity_type,
        priority: SourcePriority::from_list(&args.priority),
        output_format: args.format,
        raw_path: args.raw_output,
        daily_path: args.daily_output,
    };

    let summary = pipeline::run(&args.input, &config)?;

    println!(
        "Wrote {} and {} ({} records over {} days; daily is de-duplicated by minute and source)",
        config.raw_path.display(),
        config.daily_path.display(),
        summary.records,
        summary.days
    );

    Ok(())
}
