//! Command dispatch: wires parsed arguments to services and prints results.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::services::{FeatureSource, TreeStats};
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands, FeatureArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{write_dot, SingleChildPolicy};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Rules {
            file,
            features,
            strict,
        }) => cmd_rules(file, features, *strict),
        Some(Commands::Tree { file, features }) => cmd_tree(file, features),
        Some(Commands::Stats { file, features }) => cmd_stats(file, features),
        Some(Commands::Dot {
            file,
            features,
            output,
        }) => cmd_dot(file, features, output.as_deref()),
        Some(Commands::Config { command }) => cmd_config(command),
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
        None => Cli::command()
            .print_help()
            .map_err(|e| InfraError::io("print help", e).into()),
    }
}

/// Directory whose `.dtrules.toml` applies to `file`.
fn tree_dir(file: &Path) -> &Path {
    match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Explicit feature options win over the configured `features_file`.
pub fn feature_source(args: &FeatureArgs, settings: &Settings) -> CliResult<FeatureSource> {
    match (&args.features, &args.names) {
        (Some(path), _) => Ok(FeatureSource::File(path.clone())),
        (None, Some(names)) => {
            let names: Vec<String> = names.iter().map(|n| n.trim().to_string()).collect();
            if let Some(pos) = names.iter().position(String::is_empty) {
                return Err(CliError::InvalidArgs(format!(
                    "--names: feature name at index {} is empty",
                    pos
                )));
            }
            Ok(FeatureSource::Names(names))
        }
        (None, None) => settings
            .features_file
            .clone()
            .map(FeatureSource::File)
            .ok_or_else(|| ApplicationError::MissingFeatures.into()),
    }
}

/// Settings for `file` plus the container built from them.
fn setup(file: &Path, features: &FeatureArgs) -> CliResult<(ServiceContainer, FeatureSource)> {
    let settings = Settings::load(Some(tree_dir(file)))?;
    let source = feature_source(features, &settings)?;
    debug!(?source, policy = ?settings.single_child, "resolved settings");
    Ok((ServiceContainer::new(settings), source))
}

#[instrument(skip(features))]
fn cmd_rules(file: &Path, features: &FeatureArgs, strict: bool) -> CliResult<()> {
    let (container, source) = setup(file, features)?;
    let policy = if strict {
        SingleChildPolicy::Reject
    } else {
        container.settings.single_child
    };
    let names = container.rules.load_features(&source)?;
    // collected before printing: a failing tree prints nothing
    let rendered = container.rules.render_rules(file, &names, policy)?;
    output::raw(&rendered);
    Ok(())
}

#[instrument(skip(features))]
fn cmd_tree(file: &Path, features: &FeatureArgs) -> CliResult<()> {
    let (container, source) = setup(file, features)?;
    let names = container.rules.load_features(&source)?;
    let tree = container.rules.load_tree(file, &names)?;
    output::raw(&tree.to_tree_string().to_string());
    Ok(())
}

#[instrument(skip(features))]
fn cmd_stats(file: &Path, features: &FeatureArgs) -> CliResult<()> {
    let (container, source) = setup(file, features)?;
    let names = container.rules.load_features(&source)?;
    let stats: TreeStats = container.rules.stats(file, &names)?;
    output::header(&file.display());
    for line in stats.to_string().lines() {
        output::detail(&line);
    }
    Ok(())
}

#[instrument(skip(features))]
fn cmd_dot(file: &Path, features: &FeatureArgs, dest: Option<&Path>) -> CliResult<()> {
    let (container, source) = setup(file, features)?;
    let names = container.rules.load_features(&source)?;
    let tree = container.rules.load_tree(file, &names)?;
    match dest {
        Some(dest) => {
            container.rules.write_tree(&tree, dest)?;
            output::action("Wrote", &dest.display());
        }
        None => output::raw(&write_dot(&tree)),
    }
    Ok(())
}

fn cmd_config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show { dir } => {
            let settings = Settings::load(dir.as_deref())?;
            output::raw(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            output::header("Config paths");
            match global_config_path() {
                Some(path) => output::detail(&format!("global: {}{}", path.display(), exists_marker(&path))),
                None => output::warning("no home directory: global config unavailable"),
            }
            let local = local_config_path(Path::new("."));
            output::detail(&format!("local:  {}{}", local.display(), exists_marker(&local)));
            Ok(())
        }
        ConfigCommands::Init { global, dir } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".into())
                })?
            } else {
                local_config_path(dir.as_deref().unwrap_or(Path::new(".")))
            };
            init_config(&path)
        }
    }
}

fn exists_marker(path: &Path) -> &'static str {
    if path.exists() {
        ""
    } else {
        " (not found)"
    }
}

fn init_config(path: &Path) -> CliResult<()> {
    let container = ServiceContainer::new(Settings::default());
    if container.fs.exists(path) {
        return Err(CliError::Usage(format!(
            "config already exists: {}",
            path.display()
        )));
    }
    container
        .fs
        .ensure_parent(path)
        .map_err(|e| InfraError::io(format!("create directory for {}", path.display()), e))?;
    container
        .fs
        .write(path, &Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    output::action("Created", &path.display());
    Ok(())
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
