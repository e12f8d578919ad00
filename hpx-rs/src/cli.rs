//! Command-line argument parsing.
//!
//! Usage:
//!   hpx [-ds] <program.hpx>
//!   hpx [-ds] -c<code>

use std::path::PathBuf;

use crate::script::{Options, StopPolicy};

pub const USAGE: &str = "Usage: hpx [-ds] <program.hpx>\n       hpx [-ds] -c<code>";

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Program file to run.
    pub program: Option<PathBuf>,
    /// Program text given inline (`-c<code>`).
    pub command: Option<String>,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Reject `stop` outside of any loop (`-s`).
    pub strict_stop: bool,
}

impl CliArgs {
    /// Interpreter options selected by the flags.
    pub fn options(&self) -> Options {
        Options {
            stop_policy: if self.strict_stop {
                StopPolicy::Error
            } else {
                StopPolicy::Halt
            },
        }
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'd' => args.debug = true,
                's' => args.strict_stop = true,

                // -c<code>
                'c' => {
                    let code = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-c requires a program argument".to_owned());
                    };
                    args.command = Some(code);
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    match (positional.len(), args.command.is_some()) {
        (0, false) => return Err("no program given".to_owned()),
        (0, true) => {}
        (1, false) => args.program = Some(PathBuf::from(positional.remove(0))),
        (_, true) => return Err("-c cannot be combined with a program file".to_owned()),
        (n, false) => return Err(format!("too many arguments ({n})")),
    }

    Ok(args)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn program_positional() {
        let a = parse_argv(&argv(&["demo.hpx"])).unwrap();
        assert_eq!(a.program, Some(PathBuf::from("demo.hpx")));
        assert!(!a.debug && !a.strict_stop);
        assert_eq!(a.options().stop_policy, StopPolicy::Halt);
    }

    #[test]
    fn bool_flags() {
        let a = parse_argv(&argv(&["-d", "-s", "demo.hpx"])).unwrap();
        assert!(a.debug);
        assert!(a.strict_stop);
        assert_eq!(a.options().stop_policy, StopPolicy::Error);
    }

    #[test]
    fn combined_bool_flags() {
        let a = parse_argv(&argv(&["-ds", "demo.hpx"])).unwrap();
        assert!(a.debug && a.strict_stop);
    }

    #[test]
    fn command_embedded() {
        let a = parse_argv(&argv(&["-cprint(1)"])).unwrap();
        assert_eq!(a.command.as_deref(), Some("print(1)"));
        assert!(a.program.is_none());
    }

    #[test]
    fn command_separate_after_flags() {
        let a = parse_argv(&argv(&["-dc", "print(1)"])).unwrap();
        assert!(a.debug);
        assert_eq!(a.command.as_deref(), Some("print(1)"));
    }

    #[test]
    fn double_dash_ends_flags() {
        let a = parse_argv(&argv(&["--", "-odd.hpx"])).unwrap();
        assert_eq!(a.program, Some(PathBuf::from("-odd.hpx")));
    }

    #[test]
    fn missing_program() {
        assert!(parse_argv(&argv(&[])).is_err());
        assert!(parse_argv(&argv(&["-d"])).is_err());
        assert!(parse_argv(&argv(&["-c"])).is_err());
    }

    #[test]
    fn too_many_sources() {
        assert!(parse_argv(&argv(&["a.hpx", "b.hpx"])).is_err());
        assert!(parse_argv(&argv(&["-cprint(1)", "a.hpx"])).is_err());
    }

    #[test]
    fn unknown_flag() {
        assert!(parse_argv(&argv(&["-z", "a.hpx"])).is_err());
    }
}
