//! Command router: resolves argv against the registry and dispatches.
//!
//! Resolution walks the tree token by token (groups first, then the leaf
//! command) until it reaches a command or a flag. Argument parsing for the
//! resolved command is delegated to a `clap` parser generated from the tree,
//! which also renders `--help`, hiding hidden registrations.

use std::{
    ffi::{OsStr, OsString},
    io::Write,
};

use clap::{error::ErrorKind, ArgMatches, Command};
use tracing::debug;

use crate::lib::{errors::DispatchError, telemetry::CommandSpan};

use super::{
    handler::{CommandArgs, CommandContext, ExitStatus, ParamSpec},
    registry::{CommandEntry, CommandRegistry, GroupNode, Node, SharedHandler},
};

const MAX_SUGGESTIONS: usize = 3;
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Dispatches argv to the handlers of a finished [`CommandRegistry`].
pub struct CommandRouter {
    registry: CommandRegistry,
    parser: Command,
}

enum Resolution {
    Command {
        path: Vec<String>,
        handler: SharedHandler,
    },
    /// Stopped at a flag while still inside a group.
    GroupFlags { path: Vec<String> },
}

impl CommandRouter {
    pub(crate) fn new(registry: CommandRegistry) -> Self {
        let parser = build_parser(registry.root());
        Self { registry, parser }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Generated top-level help text.
    pub fn render_help(&self) -> String {
        self.parser.clone().render_help().to_string()
    }

    /// Resolve `argv` (without the program name), run the handler once and
    /// return its status. Diagnostics go to `err`, command output to `out`.
    ///
    /// Arguments are taken as OS strings; a command name that is not valid
    /// UTF-8 is a usage error, and argument values are checked by `clap`.
    pub fn dispatch<S: AsRef<OsStr>>(
        &self,
        argv: &[S],
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> ExitStatus {
        let argv: Vec<OsString> = argv.iter().map(|arg| arg.as_ref().to_os_string()).collect();

        let resolution = match self.resolve(&argv) {
            Ok(resolution) => resolution,
            Err(error) => return report_usage(&error, err),
        };

        let matches = match self.parse(&argv) {
            Ok(matches) => matches,
            Err(error) => return report_parse_error(error, &argv, out, err),
        };

        match resolution {
            Resolution::Command { path, handler } => {
                let Some(leaf) = leaf_matches(&matches, &path) else {
                    let error = DispatchError::MalformedArguments {
                        command: path.join(" "),
                        message: "error: failed to parse arguments".into(),
                    };
                    return report_usage(&error, err);
                };
                let args = CommandArgs::from_matches(handler.params(), leaf);
                invoke(&path.join(" "), &handler, args, out, err)
            }
            Resolution::GroupFlags { path } => {
                let group = self.group_at(&path);
                let error = DispatchError::MissingCommand {
                    group: path.join(" "),
                    available: group.map(GroupNode::visible_names).unwrap_or_default(),
                };
                report_usage(&error, err)
            }
        }
    }

    fn resolve(&self, argv: &[OsString]) -> Result<Resolution, DispatchError> {
        let mut group = self.registry.root();
        let mut path: Vec<String> = Vec::new();

        for raw in argv {
            let Some(token) = raw.to_str() else {
                return Err(DispatchError::MalformedArguments {
                    command: path.join(" "),
                    message: format!(
                        "error: invalid UTF-8 was detected in '{}'",
                        raw.to_string_lossy()
                    ),
                });
            };
            if token.starts_with('-') {
                return Ok(Resolution::GroupFlags { path });
            }
            match group.child(token) {
                Some(Node::Group(next)) => {
                    path.push(token.to_string());
                    group = next;
                }
                Some(Node::Command(CommandEntry { handler, .. })) => {
                    path.push(token.to_string());
                    return Ok(Resolution::Command {
                        path,
                        handler: handler.clone(),
                    });
                }
                None => {
                    debug!(
                        target: "agentcore::cli",
                        group = %path.join(" "),
                        name = %token,
                        "Unknown command"
                    );
                    return Err(DispatchError::UnknownCommand {
                        group: path.join(" "),
                        name: token.to_string(),
                        suggestions: suggest(token, group),
                        available: group.visible_names(),
                    });
                }
            }
        }

        Err(DispatchError::MissingCommand {
            group: path.join(" "),
            available: group.visible_names(),
        })
    }

    fn parse(&self, argv: &[OsString]) -> Result<ArgMatches, clap::Error> {
        let bin = OsString::from(self.registry.name());
        self.parser
            .clone()
            .try_get_matches_from(std::iter::once(bin).chain(argv.iter().cloned()))
    }

    fn group_at(&self, path: &[String]) -> Option<&GroupNode> {
        let mut group = self.registry.root();
        for name in path {
            match group.child(name)? {
                Node::Group(next) => group = next,
                Node::Command(_) => return None,
            }
        }
        Some(group)
    }
}

fn invoke(
    command: &str,
    handler: &SharedHandler,
    args: CommandArgs,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> ExitStatus {
    let span = CommandSpan::start(command);
    let mut ctx = CommandContext { command, args, out };
    let status = match handler.run(&mut ctx) {
        Ok(status) => status,
        Err(error) => {
            let _ = writeln!(err, "Error: {error}");
            ExitStatus::FAILURE
        }
    };
    span.finish(status.code());
    status
}

fn report_usage(error: &DispatchError, err: &mut dyn Write) -> ExitStatus {
    let _ = writeln!(err, "{}", error.render());
    ExitStatus::USAGE
}

fn report_parse_error(
    error: clap::Error,
    argv: &[OsString],
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> ExitStatus {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = write!(out, "{error}");
            ExitStatus::SUCCESS
        }
        _ => {
            let command = argv
                .iter()
                .map(|arg| arg.to_string_lossy())
                .take_while(|arg| !arg.starts_with('-'))
                .collect::<Vec<_>>()
                .join(" ");
            let error = DispatchError::MalformedArguments {
                command,
                message: error.to_string(),
            };
            report_usage(&error, err)
        }
    }
}

fn leaf_matches<'a>(matches: &'a ArgMatches, path: &[String]) -> Option<&'a ArgMatches> {
    path.iter()
        .try_fold(matches, |current, name| current.subcommand_matches(name))
}

fn build_parser(root: &GroupNode) -> Command {
    let command = Command::new(root.name.clone())
        .about(root.about.clone())
        .version(env!("CARGO_PKG_VERSION"))
        .disable_help_subcommand(true);
    add_children(command, root)
}

fn add_children(mut command: Command, group: &GroupNode) -> Command {
    for node in &group.children {
        let child = match node {
            Node::Group(child) => add_children(
                Command::new(child.name.clone())
                    .about(child.about.clone())
                    .disable_help_subcommand(true),
                child,
            ),
            Node::Command(entry) => Command::new(entry.name.clone())
                .about(entry.handler.about().to_string())
                .hide(entry.hidden)
                .args(entry.handler.params().iter().map(ParamSpec::to_arg)),
        };
        command = command.subcommand(child);
    }
    command
}

/// Nearest visible names in `group`: prefix matches first, then names within
/// a small edit distance.
fn suggest(name: &str, group: &GroupNode) -> Vec<String> {
    let lower = name.to_lowercase();
    let mut scored: Vec<(usize, String)> = group
        .visible_names()
        .into_iter()
        .filter_map(|candidate| {
            let candidate_lower = candidate.to_lowercase();
            if !lower.is_empty() && candidate_lower.starts_with(&lower) {
                return Some((0, candidate));
            }
            let distance = levenshtein(&lower, &candidate_lower);
            (distance <= MAX_SUGGESTION_DISTANCE).then_some((distance, candidate))
        })
        .collect();
    scored.sort();
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, candidate)| candidate)
        .collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let n = b_chars.len();

    let mut prev_row: Vec<usize> = (0..=n).collect();
    let mut curr_row = vec![0usize; n + 1];

    for (i, a_ch) in a_chars.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, b_ch) in b_chars.iter().enumerate() {
            let cost = usize::from(a_ch != b_ch);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[n]
}
