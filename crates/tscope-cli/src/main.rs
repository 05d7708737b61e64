#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = tscope_cli::run_from_env() {
        tracing::error!(
            target: "tscope.cli",
            error_type = error.error_type(),
            exit_code = error.exit_code(),
            "command failed"
        );
        eprintln!("tscope: {error}");
        std::process::exit(error.exit_code());
    }
}
