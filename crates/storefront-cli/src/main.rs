use clap::Parser;
use color_eyre::Result;
use storefront_core::{Config, GlobalOptions, Storefront};

mod cli;
mod dispatch;
mod output;
mod style;

use cli::StorefrontCli;
use output::{emit_output, OutputOptions};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = StorefrontCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let global = GlobalOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
        json: cli.json,
        offline: cli.offline,
    };
    let opts = OutputOptions {
        quiet: cli.quiet,
        json: cli.json,
        no_color: cli.no_color,
    };

    let info = dispatch::command_info(&cli.command);
    let outcome = match Config::from_env(&global).and_then(Storefront::from_config) {
        Ok(storefront) => dispatch::dispatch_command(&storefront, &cli.command, &opts).await,
        Err(err) => dispatch::outcome_from_result(Err(err)),
    };
    let code = emit_output(&opts, info, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = format!(
        "storefront_core={level},storefront_domain={level},storefront_cli={level}"
    );
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
