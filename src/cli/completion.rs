//! Shell completion generation for dataexport
//!
//! Generates bash, zsh and fish completion scripts. The object argument of
//! `fields`, `browse` and `export` completes dynamically from
//! `dataexport objects --plain`.

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::cli::CliArgs;
use crate::error::{ConfigError, Result};

const BIN_NAME: &str = "dataexport";

/// Generate a shell completion script and print it to stdout
///
/// # Arguments
/// * `shell_name` - Shell type (bash, zsh, fish)
pub fn generate_completion(shell_name: &str) -> Result<()> {
    let shell = parse_shell(shell_name)?;
    print!("{}", completion_script(shell)?);
    Ok(())
}

/// Parse shell name string to Shell enum
fn parse_shell(shell_name: &str) -> Result<Shell> {
    match shell_name.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        _ => Err(ConfigError::Generic(format!(
            "Unsupported shell: {}. Supported shells: bash, zsh, fish",
            shell_name
        ))
        .into()),
    }
}

fn base_completion(shell: Shell) -> String {
    let mut cmd = CliArgs::command();
    let mut buffer = Vec::new();
    generate(shell, &mut cmd, BIN_NAME, &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Build the completion script for a supported shell
fn completion_script(shell: Shell) -> Result<String> {
    let basic = base_completion(shell);
    let script = match shell {
        Shell::Bash => format!(
            r#"{basic}
# Object names come from the configured data source
_dataexport_objects() {{
    dataexport objects --plain 2>/dev/null
}}

_dataexport_enhanced() {{
    local cur prev words cword
    _init_completion || return

    case "${{words[1]}}" in
        fields|browse|export)
            if [[ $cword -eq 2 ]]; then
                COMPREPLY=($(compgen -W "$(_dataexport_objects)" -- "$cur"))
                return 0
            fi
            ;;
    esac

    _dataexport "$@"
}}

complete -F _dataexport_enhanced dataexport
"#
        ),
        Shell::Zsh => format!(
            r#"{basic}
_dataexport_objects() {{
    local -a objects
    objects=($(dataexport objects --plain 2>/dev/null))
    _describe 'objects' objects
}}

_dataexport_enhanced() {{
    if (( CURRENT == 3 )) && [[ ${{words[2]}} == (fields|browse|export) ]]; then
        _dataexport_objects
        return 0
    fi
    _dataexport "$@"
}}

compdef _dataexport_enhanced dataexport
"#
        ),
        Shell::Fish => format!(
            r#"{basic}
function __dataexport_objects
    dataexport objects --plain 2>/dev/null
end

complete -c dataexport -n "__fish_seen_subcommand_from fields browse export" -f -a "(__dataexport_objects)" -d "Object name"
"#
        ),
        _ => {
            return Err(ConfigError::Generic(
                "Unsupported shell. Supported shells: bash, zsh, fish".to_string(),
            )
            .into());
        }
    };
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shell() {
        assert!(matches!(parse_shell("bash"), Ok(Shell::Bash)));
        assert!(matches!(parse_shell("Zsh"), Ok(Shell::Zsh)));
        assert!(matches!(parse_shell("FISH"), Ok(Shell::Fish)));
        assert!(parse_shell("tcsh").is_err());
    }

    #[test]
    fn test_scripts_complete_object_names() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
            let script = completion_script(shell).unwrap();
            assert!(script.contains("dataexport objects --plain"));
        }
    }

    #[test]
    fn test_unsupported_shell_script() {
        assert!(completion_script(Shell::PowerShell).is_err());
    }
}
