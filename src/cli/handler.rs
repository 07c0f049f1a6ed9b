//! Command handler capability, parameter shapes and parsed arguments.
use std::{collections::BTreeMap, io::Write, process::ExitCode};

use clap::{builder::PossibleValuesParser, value_parser, Arg, ArgAction, ArgMatches};
use serde::Serialize;
use serde_json::{Number, Value};

use crate::lib::errors::CommandError;

/// Process exit status returned by a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus(u8);

impl ExitStatus {
    pub const SUCCESS: Self = Self(0);
    /// A handler reported an error.
    pub const FAILURE: Self = Self(1);
    /// Unknown command, missing subcommand or malformed arguments.
    pub const USAGE: Self = Self(2);
    /// The command tree itself is inconsistent.
    pub const CONFIG: Self = Self(70);

    pub const fn code(self) -> u8 {
        self.0
    }

    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(value: ExitStatus) -> Self {
        ExitCode::from(value.0)
    }
}

/// How a parameter appears on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamShape {
    /// `<value>` by position.
    Positional,
    /// `--name <value>`.
    Text,
    /// `--name <number>`, parsed as an unsigned integer.
    Number,
    /// `--name`, present or absent.
    Switch,
}

/// Declared parameter of a command handler.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub shape: ParamShape,
    pub required: bool,
    pub default_value: Option<&'static str>,
    pub choices: &'static [&'static str],
    /// Value is masked wherever the arguments are echoed back.
    pub secret: bool,
}

impl ParamSpec {
    const fn new(name: &'static str, help: &'static str, shape: ParamShape) -> Self {
        Self {
            name,
            help,
            shape,
            required: false,
            default_value: None,
            choices: &[],
            secret: false,
        }
    }

    /// Required positional argument.
    pub const fn positional(name: &'static str, help: &'static str) -> Self {
        Self::new(name, help, ParamShape::Positional).required()
    }

    pub const fn text(name: &'static str, help: &'static str) -> Self {
        Self::new(name, help, ParamShape::Text)
    }

    pub const fn number(name: &'static str, help: &'static str) -> Self {
        Self::new(name, help, ParamShape::Number)
    }

    pub const fn switch(name: &'static str, help: &'static str) -> Self {
        Self::new(name, help, ParamShape::Switch)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub const fn default_value(mut self, value: &'static str) -> Self {
        self.default_value = Some(value);
        self
    }

    pub const fn choices(mut self, values: &'static [&'static str]) -> Self {
        self.choices = values;
        self
    }

    /// Build the `clap` argument for this parameter.
    pub fn to_arg(&self) -> Arg {
        let value_name = self.name.to_uppercase().replace('-', "_");
        let mut arg = Arg::new(self.name).help(self.help);
        arg = match self.shape {
            ParamShape::Positional => arg
                .value_name(value_name)
                .required(self.required)
                .action(ArgAction::Set),
            ParamShape::Text => arg
                .long(self.name)
                .value_name(value_name)
                .required(self.required)
                .action(ArgAction::Set),
            ParamShape::Number => arg
                .long(self.name)
                .value_name(value_name)
                .required(self.required)
                .value_parser(value_parser!(u64))
                .action(ArgAction::Set),
            ParamShape::Switch => arg.long(self.name).action(ArgAction::SetTrue),
        };
        if !self.choices.is_empty() && self.shape != ParamShape::Number {
            arg = arg.value_parser(PossibleValuesParser::new(self.choices.iter().copied()));
        }
        if let Some(default) = self.default_value {
            arg = arg.default_value(default);
        }
        arg
    }

    fn read(&self, matches: &ArgMatches) -> Option<Value> {
        match self.shape {
            ParamShape::Switch => Some(Value::Bool(matches.get_flag(self.name))),
            ParamShape::Number => matches
                .get_one::<u64>(self.name)
                .map(|n| Value::Number(Number::from(*n))),
            ParamShape::Positional | ParamShape::Text => matches
                .get_one::<String>(self.name)
                .map(|s| Value::String(s.clone())),
        }
    }
}

const MASK: &str = "***";

/// Parsed arguments keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CommandArgs {
    values: BTreeMap<String, Value>,
}

impl CommandArgs {
    pub fn from_matches(params: &[ParamSpec], matches: &ArgMatches) -> Self {
        let values = params
            .iter()
            .filter_map(|param| param.read(matches).map(|v| (param.name.to_string(), v)))
            .collect();
        Self { values }
    }

    pub fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn number(&self, name: &str) -> Option<u64> {
        self.values.get(name).and_then(Value::as_u64)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.values
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Copy with every present secret parameter replaced by `***`.
    pub fn masked(&self, params: &[ParamSpec]) -> Self {
        let mut masked = self.clone();
        for param in params.iter().filter(|param| param.secret) {
            if let Some(value) = masked.values.get_mut(param.name) {
                *value = Value::String(MASK.to_string());
            }
        }
        masked
    }
}

/// Everything a handler gets for one invocation.
pub struct CommandContext<'a> {
    /// Path the user typed, e.g. `create import` or `launch`.
    pub command: &'a str,
    pub args: CommandArgs,
    pub out: &'a mut dyn Write,
}

/// One CLI command's behavior.
pub trait CommandHandler: Send + Sync {
    fn about(&self) -> &str;

    fn params(&self) -> &[ParamSpec] {
        &[]
    }

    fn run(&self, ctx: &mut CommandContext<'_>) -> Result<ExitStatus, CommandError>;
}

/// Adapter turning a closure into a [`CommandHandler`].
pub struct FnHandler<F> {
    about: String,
    params: Vec<ParamSpec>,
    run: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&mut CommandContext<'_>) -> Result<ExitStatus, CommandError> + Send + Sync,
{
    pub fn new(about: impl Into<String>, params: Vec<ParamSpec>, run: F) -> Self {
        Self {
            about: about.into(),
            params,
            run,
        }
    }
}

impl<F> CommandHandler for FnHandler<F>
where
    F: Fn(&mut CommandContext<'_>) -> Result<ExitStatus, CommandError> + Send + Sync,
{
    fn about(&self) -> &str {
        &self.about
    }

    fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    fn run(&self, ctx: &mut CommandContext<'_>) -> Result<ExitStatus, CommandError> {
        (self.run)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use clap::Command;

    use super::*;

    const PARAMS: &[ParamSpec] = &[
        ParamSpec::positional("payload", "payload"),
        ParamSpec::text("agent", "agent name"),
        ParamSpec::number("port", "port").default_value("8080"),
        ParamSpec::switch("local", "run locally"),
        ParamSpec::text("platform", "platform").choices(&["strands", "langchain"]),
    ];

    fn parse(argv: &[&str]) -> Result<CommandArgs, clap::Error> {
        let command = Command::new("test").args(PARAMS.iter().map(ParamSpec::to_arg));
        let matches = command.try_get_matches_from(std::iter::once("test").chain(argv.iter().copied()))?;
        Ok(CommandArgs::from_matches(PARAMS, &matches))
    }

    #[test]
    fn parses_each_parameter_shape() {
        let args = parse(&["{}", "--agent", "alpha", "--port", "9000", "--local"])
            .expect("arguments should parse");

        assert_eq!(args.text("payload"), Some("{}"));
        assert_eq!(args.text("agent"), Some("alpha"));
        assert_eq!(args.number("port"), Some(9000));
        assert!(args.flag("local"));
        assert_eq!(args.get("platform"), None);
    }

    #[test]
    fn defaults_and_absent_switches_are_filled_in() {
        let args = parse(&["{}"]).expect("arguments should parse");

        assert_eq!(args.number("port"), Some(8080));
        assert!(!args.flag("local"));
        assert_eq!(args.get("local"), Some(&Value::Bool(false)));
        assert_eq!(args.get("agent"), None);
    }

    #[test]
    fn rejects_missing_positional_and_bad_values() {
        assert!(parse(&[]).is_err(), "payload is required");
        assert!(parse(&["{}", "--port", "eighty"]).is_err());
        assert!(parse(&["{}", "--platform", "crewai"]).is_err());
        assert!(parse(&["{}", "--unknown"]).is_err());
    }

    #[test]
    fn masked_replaces_only_present_secrets() {
        const SECRET_PARAMS: &[ParamSpec] = &[
            ParamSpec::text("client-id", "id"),
            ParamSpec::text("client-secret", "secret").secret(),
            ParamSpec::text("api-key", "key").secret(),
        ];
        let mut args = CommandArgs::default();
        args.insert("client-id", Value::String("app".into()));
        args.insert("client-secret", Value::String("hunter2".into()));

        let masked = args.masked(SECRET_PARAMS);

        assert_eq!(masked.text("client-id"), Some("app"));
        assert_eq!(masked.text("client-secret"), Some("***"));
        assert_eq!(masked.get("api-key"), None);
        assert_eq!(args.text("client-secret"), Some("hunter2"));
    }

    #[test]
    fn exit_status_codes_are_stable() {
        assert_eq!(ExitStatus::SUCCESS.code(), 0);
        assert_eq!(ExitStatus::FAILURE.code(), 1);
        assert_eq!(ExitStatus::USAGE.code(), 2);
        assert!(ExitStatus::SUCCESS.is_success());
        assert!(!ExitStatus::CONFIG.is_success());
    }
}
