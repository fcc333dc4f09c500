use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::app::Command;
use crate::variables::VariableMap;

/// `\$`, the opening `${name` of a braced reference, or `$name`. The rest of
/// a braced reference is scanned by hand so defaults may nest.
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\\$|\$\{([A-Za-z_][A-Za-z0-9_]*)|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("reference pattern compiles")
});

/// Substitute variable references in `template`.
///
/// Unresolved references are kept as literal text unless they carry a
/// `:default`, which is expanded in their place and may itself contain
/// braced references. Values are inserted as is and never rescanned.
pub fn expand(template: &str, variables: &VariableMap) -> String {
    if !template.contains('$') {
        return template.to_string();
    }
    let mut out = String::with_capacity(template.len());
    let mut pos = 0;
    while let Some(caps) = REFERENCE.captures_at(template, pos) {
        let Some(whole) = caps.get(0) else { break };
        out.push_str(&template[pos..whole.start()]);
        pos = whole.end();

        if let Some(name) = caps.get(1) {
            let rest = &template[pos..];
            if rest.starts_with('}') {
                pos += 1;
                match variables.get(name.as_str()) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&template[whole.start()..pos]),
                }
            } else if let Some(body) = rest.strip_prefix(':')
                && let Some(len) = closing_brace(body)
            {
                // ':' + default + '}'
                pos += len + 2;
                match variables.get(name.as_str()) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&expand(&body[..len], variables)),
                }
            } else {
                // Not a complete reference
                out.push_str(whole.as_str());
            }
        } else if let Some(name) = caps.get(2) {
            out.push_str(variables.get(name.as_str()).unwrap_or(whole.as_str()));
        } else {
            // escaped dollar
            out.push('$');
        }
    }
    out.push_str(&template[pos..]);
    out
}

/// Byte offset of the `}` closing a default, skipping nested `${...}` and
/// escaped dollars.
fn closing_brace(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1) == Some(&b'$') => i += 1,
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 1;
            }
            b'}' if depth == 0 => return Some(i),
            b'}' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    None
}

/// A command after substitution, ready to spawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpandedCommand {
    /// Command line handed to the shell.
    Line(String),
    /// Program followed by its arguments, executed directly.
    Argv(Vec<String>),
}

impl fmt::Display for ExpandedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpandedCommand::Line(line) => f.write_str(line),
            ExpandedCommand::Argv(argv) => {
                for (i, arg) in argv.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    if arg.is_empty() || arg.contains(char::is_whitespace) {
                        write!(f, "{arg:?}")?;
                    } else {
                        f.write_str(arg)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Expand a command template.
///
/// Vector entries that are absent or whitespace-only are dropped before
/// substitution; the rest keep their order.
pub fn expand_command(cmd: &Command, variables: &VariableMap) -> ExpandedCommand {
    match cmd {
        Command::Single(line) => ExpandedCommand::Line(expand(line, variables)),
        Command::Args(args) => ExpandedCommand::Argv(
            args.iter()
                .flatten()
                .filter(|arg| !arg.trim().is_empty())
                .map(|arg| expand(arg, variables))
                .collect(),
        ),
    }
}
