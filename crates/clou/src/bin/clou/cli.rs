//! clou cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if clou was started in <directory>
    ///
    /// Repeated flags are applied in order, each relative
    /// to the previous one, like `git -C`.
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render deployment templates
    ///
    /// Renders the given deployments, or the config's `default` ones when none are given
    Render(RenderCommand),

    /// Evaluate a string against the configuration
    ///
    /// Example: clou eval '{{ ref vars.env }}'
    #[command(alias = "eval")]
    Evaluate(EvaluateCommand),
}

#[derive(Parser, Debug)]
pub struct RenderCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Write each template to <directory>/<stack name>.<format> instead of stdout
    #[clap(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Deployments to render
    pub deployments: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct EvaluateCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// String with `{{ }}` placeholders
    pub input_string: String,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Configuration file
    #[clap(short = 'c', long = "config", default_value = "infra.yml")]
    pub config_file: PathBuf,

    /// Template directory
    ///
    /// Defaults to `templates` next to the configuration file
    #[clap(short = 't', long = "templates")]
    pub templates: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yml",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        };
        f.write_str(name)
    }
}
