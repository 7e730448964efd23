use std::process::ExitCode;

fn main() -> ExitCode {
    match git_pkgs::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fatal: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
