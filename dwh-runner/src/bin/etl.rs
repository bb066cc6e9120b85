//! Loads the raw datasets into staging tables and populates the star schema.

use std::process::ExitCode;

use dwh_runner::core::{Job, run};

fn main() -> ExitCode {
    match run(Job::Etl) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report(Job::Etl.app_name()));
            ExitCode::FAILURE
        }
    }
}
