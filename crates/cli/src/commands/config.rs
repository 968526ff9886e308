// `redline config` — inspect and change the global configuration.
//
// `set` writes through `GlobalConfig::save_to`, creating `~/.redline/`
// on first use. `--path` targets an alternate file, which also keeps the
// tests off the real home directory.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;

use crate::config::{self, GlobalConfig};
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the current configuration
    Get(GetArgs),
    /// Set a configuration key
    Set(SetArgs),
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Config file to read (defaults to ~/.redline/config.toml).
    #[arg(long)]
    path: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigKey {
    /// Identity used for authorship and decisions.
    DisplayName,
    /// Default render mode for `redline show`.
    ShowMarkup,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// The key to change.
    #[arg(value_enum)]
    pub key: ConfigKey,

    /// The new value. An empty string clears `display-name`;
    /// `show-markup` takes `true` or `false`.
    pub value: String,

    /// Config file to write (defaults to ~/.redline/config.toml).
    #[arg(long)]
    path: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
pub struct ConfigResult {
    pub path: String,
    pub config: GlobalConfig,
}

pub fn run(cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Get(args) => get(args),
        ConfigCommand::Set(args) => set(args),
    }
}

fn get(args: GetArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let path = target_path(args.path)?;
    let config = GlobalConfig::load_from(&path).unwrap_or_default();
    let result = ConfigResult { path: path.display().to_string(), config };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn set(args: SetArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let path = target_path(args.path)?;
    let mut config = GlobalConfig::load_from(&path).unwrap_or_default();

    match args.key {
        ConfigKey::DisplayName => {
            config.display_name = (!args.value.is_empty()).then_some(args.value);
        }
        ConfigKey::ShowMarkup => {
            config.show_markup = match args.value.as_str() {
                "true" => true,
                "false" => false,
                other => anyhow::bail!("show-markup takes `true` or `false`, got `{other}`"),
            };
        }
    }
    config.save_to(&path)?;

    let result = ConfigResult { path: path.display().to_string(), config };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn target_path(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match flag {
        Some(path) => Ok(path),
        None => config::global_config_path()
            .ok_or_else(|| anyhow::anyhow!("cannot determine the home directory")),
    }
}

fn format_human(result: &ConfigResult) -> String {
    format!(
        "{}\n  display_name = {}\n  show_markup = {}",
        result.path,
        result.config.display_name.as_deref().unwrap_or("(unset)"),
        result.config.show_markup
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_creates_the_file_and_get_reads_it_back() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("nested").join("config.toml");

        set(SetArgs {
            key: ConfigKey::DisplayName,
            value: "ana".into(),
            path: Some(path.clone()),
            json: true,
        })
        .expect("set should succeed");
        set(SetArgs {
            key: ConfigKey::ShowMarkup,
            value: "true".into(),
            path: Some(path.clone()),
            json: true,
        })
        .expect("set should succeed");

        let config = GlobalConfig::load_from(&path).expect("file should exist");
        assert_eq!(config.display_name.as_deref(), Some("ana"));
        assert!(config.show_markup);

        get(GetArgs { path: Some(path), json: true }).expect("get should succeed");
    }

    #[test]
    fn empty_value_clears_the_display_name() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("config.toml");
        let seeded = GlobalConfig { display_name: Some("ana".into()), show_markup: false };
        seeded.save_to(&path).unwrap();

        set(SetArgs {
            key: ConfigKey::DisplayName,
            value: String::new(),
            path: Some(path.clone()),
            json: true,
        })
        .expect("set should succeed");
        assert_eq!(GlobalConfig::load_from(&path).unwrap().display_name, None);
    }

    #[test]
    fn show_markup_rejects_non_boolean_values() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("config.toml");

        let result = set(SetArgs {
            key: ConfigKey::ShowMarkup,
            value: "maybe".into(),
            path: Some(path),
            json: true,
        });
        assert!(result.is_err());
    }
}
