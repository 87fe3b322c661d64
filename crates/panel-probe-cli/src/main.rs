//! panel-probe CLI: run the admin panel suite and clean up after it
//!
//! ## Usage
//!
//! ```bash
//! panel-probe run                                # Scenarios, then cleanup
//! panel-probe test --filter "^users::" -j 4      # Filter scenarios
//! panel-probe cleanup --prune-missing            # Delete tracked entities
//! panel-probe ledger show --json                 # Inspect the ledger
//! panel-probe --backend browser --headed run     # Against a real panel
//! ```

use clap::Parser;
use panel_probe_cli::{
    logging, Cli, CliConfig, CliError, CliResult, ColorChoice, CommandRunner, Commands, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    logging::init(config.verbosity, config.color.should_color());
    let runner = CommandRunner::new(config, cli.env.clone(), cli.ledger.clone());

    match cli.command {
        Commands::List(args) => runner.list(&args),
        Commands::Ledger(args) => runner.ledger(&args.action),
        Commands::Test(args) => block_on(runner.test(&args)),
        Commands::Cleanup(args) => block_on(runner.cleanup(&args)),
        Commands::Run(args) => block_on(runner.run(&args)),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_backend(cli.backend.into())
        .with_headed(cli.headed)
}

fn block_on<F: std::future::Future<Output = CliResult<()>>>(future: F) -> CliResult<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::test_execution(format!("Failed to create runtime: {e}")))?;
    rt.block_on(future)
}
