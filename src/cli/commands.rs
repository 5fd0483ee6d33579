use std::fs;
use std::io;
use std::path::Path;

use clap::CommandFactory;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands, SpanArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::coverage::{build_coverage_with, CoverageOptions, CoverageTree, DegeneratePolicy};
use crate::interval::Interval;
use crate::tag::{parse_tags, Tag};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = load_settings(cli)?;
    match &cli.command {
        Some(Commands::Tree { tags, span }) => _tree(tags, span, &settings),
        Some(Commands::Leaves { tags, span }) => _leaves(tags, span, &settings),
        Some(Commands::Check { tags, span }) => _check(tags, span, &settings),
        Some(Commands::Config { command }) => _config(command, cli, &settings),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::InvalidArgs(
            "no command given, see --help".to_string(),
        )),
    }
}

/// Layered settings with command line flags applied last.
pub fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let local_dir = cli
        .config_dir
        .clone()
        .or_else(|| std::env::current_dir().ok());
    let mut settings = Settings::load(local_dir.as_deref())?;
    if cli.no_fill {
        settings.fill_gaps = false;
    }
    if cli.skip_degenerate {
        settings.degenerate = DegeneratePolicy::Skip;
    }
    debug!(?settings, "effective settings");
    Ok(settings)
}

pub fn read_tags(path: &Path) -> CliResult<Vec<Tag>> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tags(&text).map_err(|source| CliError::Input {
        path: path.to_path_buf(),
        source,
    })
}

/// `--size`, else the length of `--file`, else the largest tag end.
pub fn resolve_span(span: &SpanArgs, tags: &[Tag]) -> CliResult<Interval> {
    if let Some(size) = span.size {
        return Ok(Interval::new(0, size));
    }
    if let Some(file) = &span.file {
        let meta = fs::metadata(file).map_err(|source| CliError::Io {
            path: file.clone(),
            source,
        })?;
        return Ok(Interval::new(0, meta.len()));
    }
    let end = tags.iter().map(|t| t.span.end).max().unwrap_or(0);
    Ok(Interval::new(0, end))
}

#[instrument(level = "debug", skip(span, options))]
pub fn build_from_file(
    path: &Path,
    span: &SpanArgs,
    options: &CoverageOptions,
) -> CliResult<CoverageTree> {
    let tags = read_tags(path)?;
    let file_span = resolve_span(span, &tags)?;
    build_coverage_with(&tags, file_span, options).map_err(|source| CliError::Input {
        path: path.to_path_buf(),
        source,
    })
}

/// Independent inputs share nothing, so they are built in parallel.
fn build_all<P: AsRef<Path> + Sync>(
    paths: &[P],
    span: &SpanArgs,
    options: &CoverageOptions,
) -> Vec<CliResult<CoverageTree>> {
    paths
        .par_iter()
        .map(|p| build_from_file(p.as_ref(), span, options))
        .collect()
}

#[instrument(level = "debug", skip(span, settings))]
fn _tree<P: AsRef<Path> + Sync + std::fmt::Debug>(
    paths: &[P],
    span: &SpanArgs,
    settings: &Settings,
) -> CliResult<()> {
    let options = settings.coverage_options();
    let trees = build_all(paths, span, &options);
    for (path, tree) in paths.iter().zip(trees) {
        let tree = tree?;
        if paths.len() > 1 {
            output::header(&path.as_ref().display());
        }
        output::info(&tree.to_tree_labelled(&settings.fragment_label));
    }
    Ok(())
}

/// One `[begin,end) (len) kind description` line per leaf, in offset order.
pub fn leaf_lines(tree: &CoverageTree, fragment_label: &str) -> Vec<String> {
    tree.leaves()
        .iter()
        .map(|leaf| leaf.data().label(fragment_label))
        .collect()
}

#[instrument(level = "debug", skip(span, settings))]
fn _leaves(path: &Path, span: &SpanArgs, settings: &Settings) -> CliResult<()> {
    let tree = build_from_file(path, span, &settings.coverage_options())?;
    for line in leaf_lines(&tree, &settings.fragment_label) {
        output::info(&line);
    }
    Ok(())
}

#[instrument(level = "debug", skip(span, settings))]
fn _check<P: AsRef<Path> + Sync + std::fmt::Debug>(
    paths: &[P],
    span: &SpanArgs,
    settings: &Settings,
) -> CliResult<()> {
    let options = settings.coverage_options();
    let results = build_all(paths, span, &options);
    let mut failed = 0;
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(tree) => output::success(&format!(
                "{}: {} nodes, {} fragments, depth {}",
                path.as_ref().display(),
                tree.node_count(),
                tree.fragment_count(),
                tree.depth()
            )),
            Err(e) => {
                failed += 1;
                output::failure(&e);
            }
        }
    }
    if failed > 0 {
        return Err(CliError::CheckFailed {
            failed,
            total: paths.len(),
        });
    }
    Ok(())
}

fn _config(command: &ConfigCommands, cli: &Cli, settings: &Settings) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(p) => output::detail(&format!("global: {}", p.display())),
                None => output::detail(&"global: <unavailable>"),
            }
            let local_dir = cli
                .config_dir
                .clone()
                .or_else(|| std::env::current_dir().ok());
            if let Some(dir) = local_dir {
                output::detail(&format!("local:  {}", local_config_path(&dir).display()));
            }
        }
    }
    Ok(())
}
