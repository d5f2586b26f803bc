//! Programs that run another program given on their command line.
//!
//! `sudo -u root env FOO=1 bash -c 'rm -rf /'` is one atomic command whose
//! invocation chain is `sudo`, `env`, `bash`; the chain is what the
//! classifier matches and where `-c` payloads are looked for.

use super::{AtomicCommand, program_basename};

/// Wrappers whose first operand is the program they run.
const WRAPPERS: &[&str] = &[
    "sudo", "doas", "env", "nohup", "nice", "time", "timeout", "exec", "command", "builtin",
    "xargs",
];

/// Wrapper options that consume the following argument.
const OPTIONS_WITH_VALUE: &[(&str, &[&str])] = &[
    ("sudo", &["-u", "-g", "-C", "-D", "-h", "-p", "-r", "-t", "-U"]),
    ("doas", &["-u", "-C"]),
    ("env", &["-u", "-C", "-S"]),
    ("nice", &["-n"]),
    ("timeout", &["-s", "-k", "--signal", "--kill-after"]),
    ("xargs", &["-a", "-d", "-E", "-I", "-L", "-n", "-P", "-s"]),
];

/// One program in a wrapper chain with the arguments that follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Invocation<'a> {
    pub program: &'a str,
    pub args: &'a [String],
}

/// The command itself followed by every program it wraps, outermost first.
pub(crate) fn invocation_chain(command: &AtomicCommand) -> Vec<Invocation<'_>> {
    let mut current = Invocation {
        program: command.program_name(),
        args: &command.args,
    };
    let mut chain = vec![current];

    while WRAPPERS.contains(&current.program) {
        let Some(index) = wrapped_index(current.program, current.args) else {
            break;
        };
        current = Invocation {
            program: program_basename(&current.args[index]),
            args: &current.args[index + 1..],
        };
        chain.push(current);
    }
    chain
}

/// Position of the wrapped program within `args`, if the wrapper runs one.
fn wrapped_index(wrapper: &str, args: &[String]) -> Option<usize> {
    let takes_value = OPTIONS_WITH_VALUE
        .iter()
        .find(|(name, _)| *name == wrapper)
        .map_or(&[][..], |(_, options)| *options);

    // `timeout DURATION cmd` has a positional before the program
    let mut skip_positional = wrapper == "timeout";
    let mut index = 0;

    while let Some(arg) = args.get(index).map(String::as_str) {
        if arg == "--" {
            return (index + 1 < args.len()).then_some(index + 1);
        }
        if arg.starts_with('-') {
            // `command -v NAME` only looks NAME up
            if wrapper == "command" && is_lookup_flag(arg) {
                return None;
            }
            index += if takes_value.contains(&arg) { 2 } else { 1 };
            continue;
        }
        if wrapper == "env" && arg.contains('=') {
            index += 1;
            continue;
        }
        if skip_positional {
            skip_positional = false;
            index += 1;
            continue;
        }
        return Some(index);
    }
    None
}

fn is_lookup_flag(arg: &str) -> bool {
    arg.strip_prefix('-')
        .is_some_and(|flags| !flags.starts_with('-') && flags.contains(['v', 'V']))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn programs(program: &str, args: &[&str]) -> Vec<String> {
        let command = AtomicCommand::new(program, args.iter().map(|a| a.to_string()).collect());
        invocation_chain(&command)
            .iter()
            .map(|link| link.program.to_string())
            .collect()
    }

    #[test]
    fn unwraps_nested_wrappers() {
        assert_eq!(
            programs("sudo", &["-u", "root", "env", "A=1", "/bin/bash", "-c", "ls"]),
            vec!["sudo", "env", "bash"]
        );
        assert_eq!(programs("timeout", &["5", "kill", "1"]), vec!["timeout", "kill"]);
        assert_eq!(programs("nice", &["-n", "10", "--", "dd"]), vec!["nice", "dd"]);
    }

    #[test]
    fn trailing_args_belong_to_the_wrapped_program() {
        let command = AtomicCommand::new(
            "xargs",
            vec!["-0".into(), "sh".into(), "-c".into(), "rm \"$@\"".into()],
        );
        let chain = invocation_chain(&command);
        assert_eq!(chain[1].program, "sh");
        assert_eq!(chain[1].args, &command.args[2..]);
    }

    #[test]
    fn command_lookup_does_not_run_anything() {
        assert_eq!(programs("command", &["-v", "rm"]), vec!["command"]);
        assert_eq!(programs("command", &["-V", "curl"]), vec!["command"]);
        assert_eq!(programs("command", &["-p", "rm", "x"]), vec!["command", "rm"]);
    }

    #[test]
    fn wrapper_without_program_stops() {
        assert_eq!(programs("sudo", &["-u", "root"]), vec!["sudo"]);
        assert_eq!(programs("env", &["A=1"]), vec!["env"]);
        assert_eq!(programs("sudo", &["--"]), vec!["sudo"]);
    }
}
