//! Drops and recreates every warehouse table.

use std::process::ExitCode;

use dwh_runner::core::{Job, run};

fn main() -> ExitCode {
    match run(Job::CreateTables) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report(Job::CreateTables.app_name()));
            ExitCode::FAILURE
        }
    }
}
