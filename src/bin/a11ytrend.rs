use a11ytrend_core::cli::{self, Cli};
use a11ytrend_core::exit::A11yExit;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default = if verbose {
        "a11ytrend=debug,a11ytrend_core=debug"
    } else {
        "a11ytrend=warn,a11ytrend_core=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> A11yExit {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = if let Some(cmd) = cli.command {
        cli::dispatch::execute(cmd, cli.config.as_deref())
    } else {
        use clap::CommandFactory;
        let _ = Cli::command().print_help();
        Ok(A11yExit::Success)
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red());
            A11yExit::Error
        }
    }
}
