use anyhow::Result;
use clap::Parser;
use rwperf::cli::Cli;
use rwperf::consumer::{AverageConsumer, Collector, PassthroughConsumer};
use rwperf::{orchestrator, service};
use tracing_subscriber::EnvFilter;

/// Initialize tracing for debug output, driven by `RUST_LOG`.
///
/// Events go to stderr so the stdout protocol and the final report stay
/// clean.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let config = Cli::parse().validate()?;

    if config.subprocess {
        // Child mode: emit protocol lines for the parent to aggregate.
        let collector = Collector::spawn(PassthroughConsumer::new());
        service::run(&config, &collector.sender())?;
        let passthrough = collector.finish();
        passthrough.finish();
        return Ok(());
    }

    let collector = Collector::spawn(AverageConsumer::new(&config));

    if config.processes > 1 {
        orchestrator::run(&config, &collector.sender())?;
    } else {
        service::run(&config, &collector.sender())?;
    }

    let consumer = collector.finish();
    print!("{}", consumer.render());

    Ok(())
}
