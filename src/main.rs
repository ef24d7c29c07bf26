use strata::cli::CliOptions;
use strata::run_with_options;

fn main() {
    let options = match CliOptions::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };
    if let Err(err) = pollster::block_on(run_with_options(options)) {
        eprintln!("Application error: {err:?}");
    }
}
