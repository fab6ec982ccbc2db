//! Command-line flags.
//!
//! The bridge is started in place of envoy, so it accepts envoy's flag
//! names for the documents it needs and tolerates every other envoy flag.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{finalize, load_config, ConfigError};
use crate::config::{BridgeConfig, LogFormat};

#[derive(Debug, Default, Parser)]
#[command(name = "envoy-nginx")]
#[command(about = "Runs nginx in place of envoy, driven by envoy and SDS documents", long_about = None)]
pub struct Cli {
    /// Envoy static configuration
    #[arg(short = 'c', value_name = "PATH")]
    pub envoy_config: Option<PathBuf>,

    /// SDS document with the identity certificate and key
    #[arg(long = "id-creds", value_name = "PATH")]
    pub id_creds: Option<PathBuf>,

    /// SDS document with the container-to-container certificate and key
    #[arg(long = "c2c-creds", value_name = "PATH")]
    pub c2c_creds: Option<PathBuf>,

    /// SDS document with the trusted CA for client verification
    #[arg(long = "id-validation", value_name = "PATH")]
    pub id_validation: Option<PathBuf>,

    /// nginx executable
    #[arg(long = "nginx-bin", value_name = "PATH")]
    pub nginx_bin: Option<PathBuf>,

    /// Working directory for nginx.conf, credentials and logs
    #[arg(long = "work-dir", value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    #[arg(long = "log-format", value_enum)]
    pub log_format: Option<LogFormat>,

    /// Bridge settings file (TOML)
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Flags that take a value.
const VALUE_FLAGS: &[&str] = &[
    "-c",
    "--id-creds",
    "--c2c-creds",
    "--id-validation",
    "--nginx-bin",
    "--work-dir",
    "--log-format",
    "--config",
];

impl Cli {
    /// Parse an envoy command line, dropping the flags this binary does not know.
    pub fn parse_envoy_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::parse_from(known_args(args))
    }

    /// Defaults, then the settings file, then flags; validated last.
    pub fn load(&self) -> Result<BridgeConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => BridgeConfig::default(),
        };
        self.apply(&mut config);
        finalize(config)
    }

    /// Override `config` with every flag that was given.
    pub fn apply(&self, config: &mut BridgeConfig) {
        if let Some(path) = &self.envoy_config {
            config.envoy_config = path.clone();
        }
        if let Some(path) = &self.id_creds {
            config.id_creds = path.clone();
        }
        if let Some(path) = &self.c2c_creds {
            config.c2c_creds = Some(path.clone());
        }
        if let Some(path) = &self.id_validation {
            config.id_validation = Some(path.clone());
        }
        if let Some(path) = &self.nginx_bin {
            config.nginx.binary = Some(path.clone());
        }
        if let Some(dir) = &self.work_dir {
            config.work_dir = Some(dir.clone());
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

/// Keep the program name, help flags and every known flag with its value.
fn known_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into).peekable();
    let mut kept: Vec<OsString> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        let text = arg.to_string_lossy().into_owned();
        if matches!(text.as_str(), "-h" | "--help") {
            kept.push(arg);
            continue;
        }
        let name = text.split('=').next().unwrap_or_default();
        if !VALUE_FLAGS.contains(&name) {
            continue;
        }
        if text.contains('=') {
            kept.push(arg);
            continue;
        }
        // A flag followed by another flag has no value and is dropped.
        let has_value = args
            .peek()
            .is_some_and(|next| !next.to_string_lossy().starts_with('-'));
        if has_value {
            kept.push(arg);
            kept.extend(args.next());
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "envoy",
            "-c",
            "/conf/envoy.yaml",
            "--id-creds",
            "/conf/id.yaml",
            "--c2c-creds",
            "/conf/c2c.yaml",
            "--id-validation",
            "/conf/ca.yaml",
            "--log-format",
            "json",
        ]);
        let mut config = BridgeConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.envoy_config, Path::new("/conf/envoy.yaml"));
        assert_eq!(config.id_creds, Path::new("/conf/id.yaml"));
        assert_eq!(config.c2c_creds.as_deref(), Some(Path::new("/conf/c2c.yaml")));
        assert_eq!(config.id_validation.as_deref(), Some(Path::new("/conf/ca.yaml")));
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_absent_flags_keep_defaults() {
        let cli = Cli::parse_from(["envoy"]);
        let mut config = BridgeConfig::default();
        let defaults = config.clone();
        cli.apply(&mut config);

        assert_eq!(config.envoy_config, defaults.envoy_config);
        assert_eq!(config.id_creds, defaults.id_creds);
        assert!(config.envoy_config.ends_with("envoy.yaml"));
        assert!(config.id_creds.ends_with("sds-id-cert-and-key.yaml"));
    }

    #[test]
    fn test_unknown_envoy_flags_are_tolerated() {
        let cli = Cli::parse_envoy_args([
            "envoy",
            "--log-level",
            "info",
            "-c",
            "/conf/envoy.yaml",
            "--drain-time-s",
            "900",
        ]);
        assert_eq!(cli.envoy_config.as_deref(), Some(Path::new("/conf/envoy.yaml")));
    }

    #[test]
    fn test_flag_without_value_is_ignored() {
        let cli = Cli::parse_envoy_args(["envoy", "--id-creds", "-c", "/conf/envoy.yaml"]);
        assert_eq!(cli.id_creds, None);
        assert_eq!(cli.envoy_config.as_deref(), Some(Path::new("/conf/envoy.yaml")));
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("bridge.toml");
        let nginx = dir.path().join("nginx");
        std::fs::write(&nginx, "").unwrap();
        std::fs::write(
            &toml_path,
            format!(
                "envoy_config = \"/from/file.yaml\"\n[nginx]\nbinary = {:?}\n",
                nginx.display().to_string()
            ),
        )
        .unwrap();

        let cli = Cli {
            config: Some(toml_path),
            id_creds: Some("/from/flag.yaml".into()),
            ..Cli::default()
        };
        let config = cli.load().unwrap();

        assert_eq!(config.envoy_config, Path::new("/from/file.yaml"));
        assert_eq!(config.id_creds, Path::new("/from/flag.yaml"));
        assert_eq!(config.nginx.binary.as_deref(), Some(nginx.as_path()));
    }
}
