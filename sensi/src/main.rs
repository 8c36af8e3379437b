//! Sensitivity-directive runner.
//!
//! Applies directives such as `file::param.aom['rate'].where id=='r1' = (*1.1)`
//! to the input tables of a model environment, one directive at a time.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sensi::batch::{BatchContext, apply_directives, read_directives};
use sensi::core::syntax::parse;
use sensi::exit_codes;
use sensi::io::config::{EngineConfig, load_config, write_config};
use sensi::io::document::load_document;
use sensi::io::resolver::PathResolver;

#[derive(Parser)]
#[command(
    name = "sensi",
    version,
    about = "Apply sensitivity directives to model input tables"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the parsed form of a directive as JSON.
    Parse { directive: String },
    /// Print the input file a file directive resolves to.
    Resolve {
        /// Model document (JSON, or TOML by extension).
        #[arg(long)]
        document: PathBuf,
        /// Environment root containing the resources directory.
        #[arg(long)]
        env_dir: PathBuf,
        /// Engine config (TOML). Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        directive: String,
    },
    /// Apply directives and print a JSON report.
    Apply {
        /// Model document (JSON, or TOML by extension).
        #[arg(long)]
        document: PathBuf,
        /// Settings document with `gen_param.input_format`.
        #[arg(long)]
        settings: PathBuf,
        /// Environment root containing the resources directory.
        #[arg(long)]
        env_dir: PathBuf,
        /// Engine config (TOML). Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// File with one directive per line; applied before positional directives.
        #[arg(long)]
        directives_file: Option<PathBuf>,
        directives: Vec<String>,
    },
    /// Write a default engine config file.
    InitConfig {
        #[arg(default_value = "sensi.toml")]
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    sensi::logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Parse { directive } => cmd_parse(&directive),
        Command::Resolve {
            document,
            env_dir,
            config,
            directive,
        } => cmd_resolve(&document, &env_dir, config.as_deref(), &directive),
        Command::Apply {
            document,
            settings,
            env_dir,
            config,
            directives_file,
            directives,
        } => {
            let mut all = match directives_file {
                Some(path) => read_directives(&path)?,
                None => Vec::new(),
            };
            all.extend(directives);
            cmd_apply(&document, &settings, &env_dir, config.as_deref(), &all)
        }
        Command::InitConfig { path, force } => cmd_init_config(&path, force),
    }
}

fn cmd_parse(directive: &str) -> Result<i32> {
    let syntax = parse(directive).context("parse directive")?;
    println!("{}", serde_json::to_string_pretty(&syntax)?);
    Ok(exit_codes::OK)
}

fn cmd_resolve(
    document: &Path,
    env_dir: &Path,
    config: Option<&Path>,
    directive: &str,
) -> Result<i32> {
    let cfg = load_optional_config(config)?;
    let syntax = parse(directive).context("parse directive")?;
    if !syntax.is_file_directive() {
        bail!("'{directive}' is not a file:: directive");
    }
    let document = load_document(document)?;
    let path = PathResolver::new(&document)
        .with_resources_dir(cfg.resources_dir.as_str())
        .resolve(&syntax.expression, env_dir)
        .context("resolve input file")?;
    println!("{}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_apply(
    document: &Path,
    settings: &Path,
    env_dir: &Path,
    config: Option<&Path>,
    directives: &[String],
) -> Result<i32> {
    if directives.is_empty() {
        bail!("no directives given");
    }
    let cfg = load_optional_config(config)?;
    let document = load_document(document)?;
    let settings = load_document(settings)?;
    let ctx = BatchContext {
        document: &document,
        settings: &settings,
        env_dir,
        config: &cfg,
    };
    let report = apply_directives(directives, &ctx)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    for failure in &report.failures {
        eprintln!("failed: {}: {}", failure.directive, failure.reason);
    }
    if report.is_success() {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::PARTIAL)
    }
}

fn cmd_init_config(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &EngineConfig::default())?;
    Ok(exit_codes::OK)
}

fn load_optional_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(EngineConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_apply_with_positional_directives() {
        let cli = Cli::parse_from([
            "sensi",
            "apply",
            "--document",
            "model.json",
            "--settings",
            "settings.toml",
            "--env-dir",
            "env",
            "file::param.aom[1] = 2",
            "x = 1",
        ]);
        match cli.command {
            Command::Apply {
                directives,
                config,
                directives_file,
                ..
            } => {
                assert_eq!(directives, vec!["file::param.aom[1] = 2", "x = 1"]);
                assert!(config.is_none());
                assert!(directives_file.is_none());
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn parse_init_config_force() {
        let cli = Cli::parse_from(["sensi", "init-config", "--force"]);
        assert!(matches!(
            cli.command,
            Command::InitConfig { force: true, ref path } if path == Path::new("sensi.toml")
        ));
    }
}
