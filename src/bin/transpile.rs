/// Transpile CLI
///
/// Compiles and runs source files through the transform stage and the
/// sandboxed evaluator from the command line.

use transpile_core::cli;

fn main() {
    if let Err(e) = cli::run_cli() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
