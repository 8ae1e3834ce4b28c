// VMake conformance runner: locates vaq-make, runs every fixture, prints a per-suite report.
// Usage: test_runner [vmake_executable_path | pattern] [--root DIR] [--strict]

use std::env;
use std::process;
use vmake_harness::{cli, logging};

fn main() {
    logging::init();
    match cli::run(env::args_os()) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            process::exit(1);
        }
    }
}
