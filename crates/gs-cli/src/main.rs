use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    std::process::exit(gs_cli::run_cli_from_args(std::env::args_os()));
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}
