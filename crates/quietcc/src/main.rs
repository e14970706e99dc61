use anyhow::{Context, Result};
use clap::Parser;
use quietcc::{config, pipeline, Invocation};
use std::io::Write;

/// Run a C/C++ compiler quietly; on failure write an error report and print
/// a short summary. The exit code is always the compiler's.
#[derive(Parser, Debug)]
#[command(
    name = "quietcc",
    override_usage = "quietcc <compiler> [args...]\n       quietcc [args...]   (uses the default compiler)",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// Compiler followed by its arguments, passed through untouched
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    command: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env(config::LOG_ENV)
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let config = config::load()?;
    let cwd = std::env::current_dir().context("cannot determine working directory")?;

    let Some(invocation) = Invocation::from_argv(cli.command, &config.default_compiler) else {
        anyhow::bail!("no compiler command given");
    };
    tracing::debug!(program = %invocation.program, cwd = %cwd.display(), "quietcc starting");

    let outcome = pipeline::run(&config, &invocation, &cwd).await;
    if let Some(console) = &outcome.console {
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(console.as_bytes());
        let _ = stderr.flush();
    }

    std::process::exit(outcome.exit_code);
}
