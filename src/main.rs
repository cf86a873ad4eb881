use std::process::ExitCode;

fn main() -> ExitCode {
    match paintrack::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("paintrack: {e}");
            ExitCode::FAILURE
        }
    }
}
