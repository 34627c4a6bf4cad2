mod cli;

use anyhow::Context;
use clou::options::Options;
use clou::render::Renderer;
use clou::source::{FsContentProvider, TemplateDirectory};
use clou::value::Value;
use std::path::{Path, PathBuf};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("CLOU_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Render(render_cli) => render(render_cli),
        cli::Command::Evaluate(eval_cli) => evaluate(eval_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

/// Configuration document plus the collaborators to evaluate it with
struct Project {
    config: Value,
    content: FsContentProvider,
    templates: TemplateDirectory,
}

impl Project {
    fn load(input: &cli::InputArgs) -> anyhow::Result<Self> {
        let config = clou::source::load_file(&input.config_file)?;

        // `file` expressions and the default template directory are relative to the config file
        let base = input
            .config_file
            .canonicalize()
            .with_context(|| format!("unable to resolve {}", input.config_file.display()))?
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let templates = input
            .templates
            .clone()
            .unwrap_or_else(|| base.join("templates"));

        Ok(Self {
            config,
            content: FsContentProvider::new(base),
            templates: TemplateDirectory::new(templates),
        })
    }
}

pub fn render(cli: cli::RenderCommand) -> anyhow::Result<()> {
    let project = Project::load(&cli.input)?;
    let options = Options::default();
    let renderer = Renderer::new(&project.content, &project.templates, &options);

    let rendered = renderer.render(&project.config, &cli.deployments)?;

    let Some(output_dir) = cli.output_dir else {
        for (position, deployment) in rendered.iter().enumerate() {
            if position > 0 && matches!(cli.output.format, cli::OutputFormat::Yaml) {
                println!("---");
            }
            println!("{}", format(&cli.output, &deployment.template)?);
        }
        return Ok(());
    };

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("unable to create {}", output_dir.display()))?;

    for deployment in &rendered {
        let file_path: PathBuf = output_dir.join(format!(
            "{}.{}",
            deployment.file_stem(),
            cli.output.format.extension()
        ));
        std::fs::write(&file_path, format(&cli.output, &deployment.template)?)
            .with_context(|| format!("unable to write {}", file_path.display()))?;

        tracing::info!(deployment=%deployment.name, path=%file_path.display(), "written template");
    }

    Ok(())
}

pub fn evaluate(cli: cli::EvaluateCommand) -> anyhow::Result<()> {
    let project = Project::load(&cli.input)?;
    let options = Options::default();
    let renderer = Renderer::new(&project.content, &project.templates, &options);

    let value = renderer.evaluate(&project.config, &cli.input_string)?;

    println!("{}", format(&cli.output, &value)?);
    Ok(())
}

fn format(output: &cli::OutputArgs, value: &Value) -> anyhow::Result<String> {
    let text = match output.format {
        cli::OutputFormat::Yaml => clou::source::to_yaml(value)?,
        cli::OutputFormat::Json => clou::source::to_json(value)?,
    };

    Ok(text.trim_end().to_string())
}
