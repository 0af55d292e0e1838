mod cli;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let invocation = match cli::run() {
        cli::RunOutcome::Execute(invocation) => invocation,
        cli::RunOutcome::Exit(code) => std::process::exit(code),
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&invocation.config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let code = cli::execute(invocation).await;
    std::process::exit(code);
}
