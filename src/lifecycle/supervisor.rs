//! Supervisor: prepares the working directory, launches nginx once every
//! watcher is ready, and reloads it on credential rotation.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinSet;

use crate::config::BridgeConfig;
use crate::envoy::{ConfigSource, EnvoyConfParser};
use crate::error::{BridgeError, ChildAction};
use crate::lifecycle::process::{CommandRunner, TokioCommandRunner};
use crate::lifecycle::startup::launch_when_ready;
use crate::lifecycle::tailer::{LogTailer, DEFAULT_POLL_INTERVAL};
use crate::nginx::{tls, NginxConfig, WorkingLayout};
use crate::observability::metrics;
use crate::rotation::RotationWatcher;
use crate::sds::{BundleKind, CredentialSource, SdsCredParser, SdsValidationParser, ValidationSource};

const STAGE_TLS: &str = "write tls files";
const STAGE_GENERATE: &str = "generate nginx config from envoy config";
const STAGE_TAIL: &str = "tail error log";

/// Owns every task of one bridge run.
pub struct Supervisor {
    nginx: NginxConfig,
    config_source: Arc<dyn ConfigSource>,
    credentials: Vec<Arc<dyn CredentialSource>>,
    validation: Option<Arc<dyn ValidationSource>>,
    nginx_binary: PathBuf,
    runner: Arc<dyn CommandRunner>,
    settle: Duration,
    tail_interval: Duration,
}

impl Supervisor {
    /// A supervisor with no credential sources and the real process runner.
    pub fn new(nginx: NginxConfig, config_source: Arc<dyn ConfigSource>, nginx_binary: PathBuf) -> Self {
        Self {
            nginx,
            config_source,
            credentials: Vec::new(),
            validation: None,
            nginx_binary,
            runner: Arc::new(TokioCommandRunner),
            settle: Duration::from_millis(250),
            tail_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Wire the SDS parsers and nginx settings described by `config`.
    pub fn from_config(config: &BridgeConfig) -> Self {
        let layout = WorkingLayout::new(config.work_dir());
        let nginx = NginxConfig::new(layout, config.nginx.clone());
        let envoy = EnvoyConfParser::new(&config.envoy_config, config.translation.mode);

        let mut supervisor = Self::new(nginx, Arc::new(envoy), config.nginx_binary())
            .with_settle(config.rotation.settle())
            .with_credentials(Arc::new(SdsCredParser::new(&config.id_creds, BundleKind::Identity)));
        if let Some(c2c) = &config.c2c_creds {
            supervisor = supervisor.with_credentials(Arc::new(SdsCredParser::new(c2c, BundleKind::C2c)));
        }
        if let Some(validation) = &config.id_validation {
            supervisor = supervisor.with_validation(Arc::new(SdsValidationParser::new(validation)));
        }
        supervisor
    }

    pub fn with_credentials(mut self, source: Arc<dyn CredentialSource>) -> Self {
        self.credentials.push(source);
        self
    }

    pub fn with_validation(mut self, source: Arc<dyn ValidationSource>) -> Self {
        self.validation = Some(source);
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_tail_interval(mut self, interval: Duration) -> Self {
        self.tail_interval = interval;
        self
    }

    pub fn layout(&self) -> &WorkingLayout {
        self.nginx.layout()
    }

    /// Run until the first task finishes; its result is returned and every
    /// other task is aborted.
    pub async fn run(self) -> Result<(), BridgeError> {
        let layout = self.layout().clone();
        layout.create()?;
        tracing::info!(work_dir = %layout.root().display(), "Working directory prepared");

        let nginx_ctl = Arc::new(NginxControl {
            layout: layout.clone(),
            binary: self.nginx_binary.clone(),
            runner: self.runner.clone(),
            daemon: self.nginx.settings().daemon,
        });

        for source in &self.credentials {
            nginx_ctl.write_credentials(source.as_ref()).map_err(|e| e.context(STAGE_TLS))?;
        }
        if let Some(source) = &self.validation {
            nginx_ctl.write_validation(source.as_ref()).map_err(|e| e.context(STAGE_TLS))?;
        }

        self.nginx
            .generate(self.config_source.as_ref())
            .map_err(|e| e.context(STAGE_GENERATE))?;

        let mut tailer = LogTailer::new(layout.error_log()).with_interval(self.tail_interval);
        tailer.prepare().map_err(|e| e.context(STAGE_TAIL))?;

        let mut tasks = JoinSet::new();
        tasks.spawn(async move { tailer.run().await.map_err(|e| e.context(STAGE_TAIL)) });

        let mut ready = Vec::new();
        for source in self.credentials {
            let (tx, rx) = oneshot::channel();
            ready.push(rx);
            let watcher = RotationWatcher::new(source.path(), self.settle);
            let ctl = nginx_ctl.clone();
            tasks.spawn(watcher.watch(tx, move || {
                let ctl = ctl.clone();
                let source = source.clone();
                async move { ctl.rotate_credentials(source.as_ref()).await }
            }));
        }
        if let Some(source) = self.validation {
            let (tx, rx) = oneshot::channel();
            ready.push(rx);
            let watcher = RotationWatcher::new(source.path(), self.settle);
            let ctl = nginx_ctl.clone();
            tasks.spawn(watcher.watch(tx, move || {
                let ctl = ctl.clone();
                let source = source.clone();
                async move { ctl.rotate_validation(source.as_ref()).await }
            }));
        }

        let ctl = nginx_ctl.clone();
        tasks.spawn(launch_when_ready(ready, async move { ctl.launch().await }));

        let first = tasks.join_next().await;
        tasks.abort_all();
        match first {
            Some(result) => result?,
            None => Ok(()),
        }
    }
}

/// Shared by the launcher and every watcher callback.
struct NginxControl {
    layout: WorkingLayout,
    binary: PathBuf,
    runner: Arc<dyn CommandRunner>,
    daemon: bool,
}

impl NginxControl {
    fn write_credentials(&self, source: &dyn CredentialSource) -> Result<(), BridgeError> {
        let bundle = source.cert_and_key()?;
        tls::write_bundle(&self.layout, &bundle)
    }

    fn write_validation(&self, source: &dyn ValidationSource) -> Result<(), BridgeError> {
        let ca = source.ca_cert()?;
        tls::write_ca(&self.layout, &ca)?;
        Ok(())
    }

    async fn rotate_credentials(&self, source: &dyn CredentialSource) -> Result<(), BridgeError> {
        tracing::info!(bundle = %source.kind(), "Rotating credentials");
        self.write_credentials(source).map_err(|e| e.context(STAGE_TLS))?;
        self.reload().await
    }

    async fn rotate_validation(&self, source: &dyn ValidationSource) -> Result<(), BridgeError> {
        tracing::info!("Rotating trusted CA");
        self.write_validation(source).map_err(|e| e.context(STAGE_TLS))?;
        self.reload().await
    }

    async fn launch(&self) -> Result<(), BridgeError> {
        let args = launch_args(&self.layout);
        tracing::info!(binary = %self.binary.display(), ?args, "Starting nginx");
        self.runner
            .run(&self.binary, &args)
            .await
            .map_err(|source| BridgeError::ChildProcess {
                action: ChildAction::Launch,
                source,
            })?;

        if self.daemon {
            tracing::info!("nginx daemonized, supervising watchers only");
            std::future::pending::<()>().await;
        }
        tracing::info!("nginx exited");
        Ok(())
    }

    async fn reload(&self) -> Result<(), BridgeError> {
        let args = reload_args(&self.layout);
        tracing::info!(binary = %self.binary.display(), ?args, "Reloading nginx");
        match self.runner.run(&self.binary, &args).await {
            Ok(()) => {
                metrics::record_reload(true);
                Ok(())
            }
            Err(source) => {
                metrics::record_reload(false);
                Err(BridgeError::ChildProcess {
                    action: ChildAction::Reload,
                    source,
                })
            }
        }
    }
}

/// `-p` value: the working directory with a trailing separator.
fn prefix_arg(layout: &WorkingLayout) -> OsString {
    let mut prefix = layout.root().as_os_str().to_os_string();
    prefix.push(std::path::MAIN_SEPARATOR.to_string());
    prefix
}

pub fn launch_args(layout: &WorkingLayout) -> Vec<OsString> {
    vec![
        "-c".into(),
        layout.conf_file().into_os_string(),
        "-p".into(),
        prefix_arg(layout),
    ]
}

/// Launch arguments plus `-s reload`; nginx built with a non-default
/// conf path would otherwise signal the pid named in its own config.
pub fn reload_args(layout: &WorkingLayout) -> Vec<OsString> {
    let mut args = launch_args(layout);
    args.push("-s".into());
    args.push("reload".into());
    args
}
