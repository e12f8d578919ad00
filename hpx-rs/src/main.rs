use hpx::cli;
use hpx::loader;
use hpx::logging;
use hpx::script::{Interpreter, StdConsole};

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("hpx: {e}");
            eprintln!("{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    logging::init(args.debug);

    let lines = match (&args.command, &args.program) {
        (Some(code), _) => loader::split_lines(code),
        (None, Some(path)) => match loader::load_program(path) {
            Ok(lines) => lines,
            Err(e) => {
                eprintln!("HPX Error: {e}");
                std::process::exit(1);
            }
        },
        (None, None) => {
            eprintln!("{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    let mut interp = Interpreter::with_options(StdConsole::new(), args.options());
    if let Err(e) = interp.execute(&lines) {
        eprintln!("HPX Error: {e}");
        std::process::exit(1);
    }
}
