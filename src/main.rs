use std::process::ExitCode;

/// Entry point for the Citadel host-metrics sampler.
///
/// Takes the path of a JSON configuration file as its only argument, then samples CPU and
/// memory usage on the configured period until interrupted.
///
/// Exits with status `1` and a diagnostic on standard error if the argument is missing, the
/// configuration cannot be loaded, or an output cannot be opened.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug cargo run -- /etc/citadel.json
/// ```
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();

    let Some(config_path) = citadel_monitor::config_path_from_args(std::env::args_os()) else {
        let program = citadel_monitor::program_name(std::env::args_os());
        eprintln!("Usage: {program} <config_path>");
        return ExitCode::FAILURE;
    };

    match citadel_monitor::run(&config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
