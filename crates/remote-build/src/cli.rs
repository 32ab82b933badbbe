//! Command line arguments and configuration loading.

use std::path::PathBuf;

use remote_build_core::{Error, RemoteBuildConfig, Result};

/// Parsed command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// `--config <path>`: base configuration file
    pub config: Option<PathBuf>,
    /// `--override <yaml>`: partial YAML documents merged over the base, in order
    pub overrides: Vec<String>,
}

impl CliArgs {
    /// Parse arguments, skipping the program name.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter().skip(1);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args
                        .next()
                        .ok_or_else(|| Error::Config("--config needs a path".to_string()))?;
                    parsed.config = Some(PathBuf::from(path));
                }
                "--override" => {
                    let yaml = args
                        .next()
                        .ok_or_else(|| Error::Config("--override needs a YAML document".to_string()))?;
                    parsed.overrides.push(yaml);
                }
                other => return Err(Error::Config(format!("unknown argument '{other}'"))),
            }
        }
        Ok(parsed)
    }

    /// Load the base configuration and apply every override.
    pub fn load_config(&self) -> Result<RemoteBuildConfig> {
        let base = match &self.config {
            Some(path) => RemoteBuildConfig::from_file(path)?,
            None => RemoteBuildConfig::default(),
        };
        self.overrides
            .iter()
            .try_fold(base, |config, overlay| config.merge_yaml(overlay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("remote-build")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_parse_config_and_overrides() {
        let parsed = CliArgs::parse(args(&[
            "--config",
            "build.yaml",
            "--override",
            "view: {filter: error}",
        ]))
        .unwrap();

        assert_eq!(parsed.config, Some(PathBuf::from("build.yaml")));
        assert_eq!(parsed.overrides, vec!["view: {filter: error}"]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(CliArgs::parse(args(&["--config"])).is_err());
        assert!(CliArgs::parse(args(&["--verbose"])).is_err());
    }

    #[test]
    fn test_overrides_apply_in_order() {
        let parsed = CliArgs::parse(args(&[
            "--override",
            "remote: {host: first, build_command: make}",
            "--override",
            "remote: {host: second}",
        ]))
        .unwrap();

        let config = parsed.load_config().unwrap();
        assert_eq!(config.remote.host, "second");
        assert_eq!(config.remote.build_command, "make");
        assert_eq!(config.view.max_lines, 20000);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let parsed = CliArgs::parse(args(&["--override", "view: {max_lines: 0}"])).unwrap();
        assert!(matches!(parsed.load_config(), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let parsed = CliArgs::parse(args(&["--config", "/nonexistent/remote-build.yaml"])).unwrap();
        assert!(matches!(parsed.load_config(), Err(Error::Io(_))));
    }
}
