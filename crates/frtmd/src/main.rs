use std::process::ExitCode;

fn main() -> ExitCode {
    match frtmd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("frtmd: {error}");
            ExitCode::FAILURE
        }
    }
}
