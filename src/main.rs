use std::process::ExitCode;

fn main() -> ExitCode {
    match labscribe::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Labscribe stopped");
            eprintln!("labscribe: {e}");
            ExitCode::FAILURE
        }
    }
}
