//! Shared utilities for supervisor integration tests.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use envoy_nginx::error::CommandError;
use envoy_nginx::lifecycle::CommandRunner;
use envoy_nginx::{BridgeConfig, Supervisor};

/// How the fake nginx behaves when launched.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Stay in the foreground until killed.
    Block,
    /// Exit 0 straight away.
    Exit,
    /// Exit non-zero.
    Fail,
}

/// One recorded invocation of the fake nginx.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub binary: PathBuf,
    pub args: Vec<OsString>,
}

#[allow(dead_code)]
impl Invocation {
    pub fn is_reload(&self) -> bool {
        self.args.ends_with(&[OsString::from("-s"), OsString::from("reload")])
    }
}

/// Records every call and answers the way a scripted nginx would.
pub struct FakeRunner {
    calls: mpsc::UnboundedSender<Invocation>,
    launch: LaunchMode,
    fail_reload: bool,
}

#[allow(dead_code)]
impl FakeRunner {
    pub fn new(launch: LaunchMode) -> (Self, mpsc::UnboundedReceiver<Invocation>) {
        let (calls, rx) = mpsc::unbounded_channel();
        (
            Self {
                calls,
                launch,
                fail_reload: false,
            },
            rx,
        )
    }

    /// Mimic an nginx whose `-s reload` exits 1.
    pub fn failing_reload(mut self) -> Self {
        self.fail_reload = true;
        self
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, binary: &Path, args: &[OsString]) -> Result<(), CommandError> {
        let invocation = Invocation {
            binary: binary.to_path_buf(),
            args: args.to_vec(),
        };
        let reload = invocation.is_reload();
        let _ = self.calls.send(invocation);

        if reload {
            return if self.fail_reload {
                Err(CommandError::Other("exit status 1".into()))
            } else {
                Ok(())
            };
        }
        match self.launch {
            LaunchMode::Block => std::future::pending().await,
            LaunchMode::Exit => Ok(()),
            LaunchMode::Fail => Err(CommandError::Other("banana".into())),
        }
    }
}

/// Path of a file under tests/fixtures.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

/// Replace `target` the way the credential publisher does: write a sibling
/// `.tmp` file and rename it over the target.
#[allow(dead_code)]
pub fn rotate(target: &Path, contents: &[u8]) {
    let mut tmp = target.as_os_str().to_os_string();
    tmp.push(".tmp");
    std::fs::write(&tmp, contents).unwrap();
    std::fs::rename(&tmp, target).unwrap();
}

/// Credential documents copied into a private directory so tests can rotate them.
pub struct Workspace {
    pub dir: tempfile::TempDir,
    pub config: BridgeConfig,
}

#[allow(dead_code)]
impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let copy = |name: &str| {
            let dst = dir.path().join(name);
            std::fs::copy(fixture(name), &dst).unwrap();
            dst
        };

        let mut config = BridgeConfig::default();
        config.envoy_config = fixture("envoy.yaml");
        config.id_creds = copy("sds-id-cert-and-key.yaml");
        config.c2c_creds = Some(copy("sds-c2c-cert-and-key.yaml"));
        config.id_validation = Some(copy("sds-id-validation-context.yaml"));
        config.work_dir = Some(dir.path().join("work"));
        config.nginx.binary = Some(PathBuf::from("/fake/nginx"));
        config.rotation.settle_ms = 50;

        Self { dir, config }
    }

    pub fn work_dir(&self) -> PathBuf {
        self.config.work_dir()
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.work_dir().join(name)).unwrap()
    }

    pub fn supervisor(&self, runner: FakeRunner) -> Supervisor {
        Supervisor::from_config(&self.config)
            .with_runner(Arc::new(runner))
            .with_tail_interval(Duration::from_millis(20))
    }
}

/// Next invocation, failing the test after a generous deadline.
#[allow(dead_code)]
pub async fn next_call(rx: &mut mpsc::UnboundedReceiver<Invocation>) -> Invocation {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("no nginx invocation within deadline")
        .expect("runner dropped")
}

/// Assert nothing else is invoked for `quiet`.
#[allow(dead_code)]
pub async fn assert_no_call(rx: &mut mpsc::UnboundedReceiver<Invocation>, quiet: Duration) {
    if let Ok(Some(call)) = tokio::time::timeout(quiet, rx.recv()).await {
        panic!("unexpected nginx invocation: {call:?}");
    }
}
