//! Generates an Icinga 2 `CheckCommand` object for the plugin from its clap definition, so
//! the command config never drifts from the arguments the binary actually accepts.

use std::ffi::OsString;

use clap::ArgAction;

/// Setting this environment variable to anything but an empty string or `0` makes the binary
/// print its command config and exit.
pub const GENERATE_ENV: &str = "GENERATE_ICINGA_COMMAND";

pub struct CheckCommand {
    arguments: Vec<CommandArgument>,
}

struct CommandArgument {
    flag: String,
    var: String,
    description: Option<String>,
    is_switch: bool,
    required: bool,
    default_value: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum IcingaCommandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid executable path")]
    InvalidExecutablePath,
    #[error("argument '{0}' has neither a short nor a long flag")]
    MissingFlag(String),
}

impl CheckCommand {
    /// Collects the arguments of `cmd`. Custom variables are named `<var_prefix>_<arg id>`.
    pub fn from_command(var_prefix: &str, cmd: &clap::Command) -> Result<Self, IcingaCommandError> {
        let mut arguments = Vec::new();

        for arg in cmd.get_arguments() {
            let is_switch = match arg.get_action() {
                ArgAction::Help
                | ArgAction::HelpShort
                | ArgAction::HelpLong
                | ArgAction::Version => continue,
                ArgAction::SetTrue => true,
                _ => false,
            };

            let flag = arg
                .get_short()
                .map(|short| format!("-{}", short))
                .or_else(|| arg.get_long().map(|long| format!("--{}", long)))
                .ok_or_else(|| IcingaCommandError::MissingFlag(arg.get_id().to_string()))?;

            let default_value = if is_switch {
                None
            } else {
                arg.get_default_values()
                    .first()
                    .and_then(|v| v.to_str())
                    .map(|s| s.to_owned())
            };

            arguments.push(CommandArgument {
                flag,
                var: format!("{}_{}", var_prefix, arg.get_id()),
                description: arg.get_help().map(|s| s.to_string()),
                is_switch,
                required: arg.is_required_set(),
                default_value,
            });
        }

        Ok(CheckCommand { arguments })
    }

    pub fn render(&self, name: &str, executable: &str) -> String {
        let mut out = format!("object CheckCommand \"{}\" {{\n", escape_string(name));
        out.push_str(&format!("  command = [ \"{}\" ]\n", escape_string(executable)));
        out.push_str("  arguments = {\n");

        for arg in &self.arguments {
            out.push_str(&format!("    \"{}\" = {{\n", arg.flag));

            if arg.is_switch {
                out.push_str(&format!("      set_if = \"${}$\"\n", arg.var));
            } else {
                out.push_str(&format!("      value = \"${}$\"\n", arg.var));
            }

            if let Some(description) = &arg.description {
                out.push_str(&format!(
                    "      description = \"{}\"\n",
                    escape_string(description)
                ));
            }

            if arg.required {
                out.push_str("      required = true\n");
            }

            out.push_str("    }\n");
        }

        out.push_str("  }\n");

        let defaults = self
            .arguments
            .iter()
            .filter_map(|arg| arg.default_value.as_ref().map(|v| (&arg.var, v)))
            .collect::<Vec<_>>();
        if !defaults.is_empty() {
            out.push('\n');
        }
        for (var, value) in defaults {
            out.push_str(&format!("  vars.{} = \"{}\"\n", var, escape_string(value)));
        }

        out.push_str("}\n");
        out
    }
}

fn escape_string(s: &str) -> String {
    ["\\", "\"", "$"]
        .iter()
        .fold(s.to_string(), |acc, c| acc.replace(c, &format!("\\{}", c)))
}

/// Whether the value of [GENERATE_ENV] asks for the command config. Unset, empty and `0`
/// leave the plugin in check mode, so a stray empty variable can't turn every check into an
/// OK exit.
pub fn generation_requested(value: Option<OsString>) -> bool {
    match value {
        Some(value) => !value.is_empty() && value != "0",
        None => false,
    }
}

/// Prints the command config for the running executable and exits with 0 if
/// [GENERATE_ENV] requests it (see [generation_requested]). Returns without doing anything
/// otherwise.
pub fn print_icinga_command_if_env_and_exit(
    name: &str,
    cmd: &clap::Command,
) -> Result<(), IcingaCommandError> {
    if !generation_requested(std::env::var_os(GENERATE_ENV)) {
        return Ok(());
    }

    let executable = std::env::current_exe()?
        .to_str()
        .ok_or(IcingaCommandError::InvalidExecutablePath)?
        .to_owned();

    let command = CheckCommand::from_command(name, cmd)?;
    println!("{}", command.render(name, &executable).trim());
    std::process::exit(0);
}
