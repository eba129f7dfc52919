use std::process::ExitCode;
use clap::Parser as ClapParser;
use feebl::Config;
use feebl::util;
use feebl::util::logger::StderrLogger;

fn main() -> ExitCode {
    let config: Config = Config::parse();

    if let Err(err) = StderrLogger::init(config.verbose) {
        eprintln!("Could not install logger: {}", err);
    }

    // Deep recursion in scripts needs more stack than the main thread has
    match util::with_interpreter_stack(move || feebl::run(&config)) {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(err)) => {
            eprintln!("{}", err);
            ExitCode::from(err.exit_code())
        },
        Err(err) => {
            eprintln!("Could not start the interpreter thread: {}", err);
            ExitCode::FAILURE
        },
    }
}
