use std::process::ExitCode;

use lua_annotations::cli;

fn main() -> ExitCode {
    let command_line_interface = cli::CommandLineInterface::load();
    cli::init_tracing(command_line_interface.verbose());
    match command_line_interface.run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
