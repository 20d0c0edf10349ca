use std::process::ExitCode;

mod platform;

fn main() -> ExitCode {
    match platform::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("prioritizer: {err}");
            ExitCode::from(1)
        }
    }
}
