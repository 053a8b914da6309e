use std::process::ExitCode;

use clap::Parser;
use mem_hub::{Hub, LogConfig, Shell, ShellStatus, init_logging, install_panic_hook};

#[derive(Parser)]
#[command(name = "hub", version, about = "Plugin-driven note hub")]
struct Cli {
    /// Use the `-debug` config and data directories and refresh bundled plugins.
    #[arg(long, env = "HUB_DEBUG", default_value_t = false)]
    debug: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "HUB_LOG", default_value = mem_hub::observability::DEFAULT_LOG_LEVEL)]
    log_level: String,

    /// `<plugin>[:<command>] [args...]`, or a core command. Omit for the
    /// interactive prompt.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&LogConfig::new(&cli.log_level)) {
        eprintln!("{e}");
    }
    install_panic_hook();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> mem_hub::Result<ExitCode> {
    let shell = Shell::new(Hub::from_env(cli.debug).await?);

    if cli.args.is_empty() {
        shell.run_interactive().await?;
        return Ok(ExitCode::SUCCESS);
    }

    let status = shell
        .execute(&cli.args, &mut std::io::stdout(), &mut std::io::stderr())
        .await?;
    Ok(match status {
        ShellStatus::Failed => ExitCode::FAILURE,
        ShellStatus::Ok | ShellStatus::Exit => ExitCode::SUCCESS,
    })
}
