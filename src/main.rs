use clap::Parser;
use clap::error::ErrorKind;
use dirsort::cli::{self, Args};
use dirsort::output::OutputFormatter;
use std::process;

fn main() {
    // Usage errors exit with 1, --help and --version with 0.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            e.print().ok();
            process::exit(code);
        }
    };

    if let Err(e) = cli::run(args) {
        OutputFormatter::error(&e);
        process::exit(1);
    }
}
