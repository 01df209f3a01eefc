// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! LWM2M daemon process lifecycle.
//!
//! The daemons are opaque executables: we build their argv, start them,
//! probe their IPC port until they answer, and signal them on the way out.
//! Binaries are looked up through `LWM2M_SERVERD_BIN`, `LWM2M_CLIENTD_BIN`
//! and `LWM2M_BOOTSTRAPD_BIN`, falling back to `PATH`.

use crate::catalog::{ClientOp, ServerOp};
use crate::error::{IpcError, Result};
use crate::message::Request;
use crate::transport::wait_for_ipc;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path as FsPath, PathBuf};
use std::process::{Child, Command, Stdio};
use std::str::FromStr;
use std::time::{Duration, Instant};

pub const SERVER_BIN_ENV: &str = "LWM2M_SERVERD_BIN";
pub const CLIENT_BIN_ENV: &str = "LWM2M_CLIENTD_BIN";
pub const BOOTSTRAP_BIN_ENV: &str = "LWM2M_BOOTSTRAPD_BIN";

/// Default bound on the readiness probe.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// How long `terminate` waits for the process to exit before giving up on it.
const EXIT_GRACE: Duration = Duration::from_millis(500);

/// CoAP payload encodings the server daemon can be told to prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentType {
    TextPlain,
    OctetStream,
    Json,
    Lwm2mText,
    #[default]
    Lwm2mTlv,
    Lwm2mJson,
}

impl ContentType {
    pub const ALL: [ContentType; 6] = [
        Self::TextPlain,
        Self::OctetStream,
        Self::Json,
        Self::Lwm2mText,
        Self::Lwm2mTlv,
        Self::Lwm2mJson,
    ];

    /// Numeric id passed as `--contentType`.
    pub const fn id(self) -> u16 {
        match self {
            Self::TextPlain => 0,
            Self::OctetStream => 42,
            Self::Json => 50,
            Self::Lwm2mText => 1541,
            Self::Lwm2mTlv => 1542,
            Self::Lwm2mJson => 1543,
        }
    }

    pub const fn mime(self) -> &'static str {
        match self {
            Self::TextPlain => "text/plain",
            Self::OctetStream => "application/octet-stream",
            Self::Json => "application/json",
            Self::Lwm2mText => "application/vnd.oma.lwm2m+text",
            Self::Lwm2mTlv => "application/vnd.oma.lwm2m+tlv",
            Self::Lwm2mJson => "application/vnd.oma.lwm2m+json",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for ContentType {
    type Err = IpcError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|ct| ct.mime() == s)
            .ok_or_else(|| IpcError::InvalidArgument(format!("Unknown content type '{}'", s)))
    }
}

/// Which daemon a process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DaemonKind {
    Server,
    Client,
    Bootstrap,
}

impl DaemonKind {
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::Server => SERVER_BIN_ENV,
            Self::Client => CLIENT_BIN_ENV,
            Self::Bootstrap => BOOTSTRAP_BIN_ENV,
        }
    }

    pub const fn default_binary(self) -> &'static str {
        match self {
            Self::Server => "awa_serverd",
            Self::Client => "awa_clientd",
            Self::Bootstrap => "awa_bootstrapd",
        }
    }

    /// Binary named by the environment, else the bare name for `PATH` lookup.
    pub fn binary(self) -> PathBuf {
        std::env::var_os(self.env_var())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(self.default_binary()))
    }

    /// Request that any live instance answers, used as the readiness probe.
    pub fn ready_probe(self) -> Option<Result<Vec<u8>>> {
        match self {
            Self::Server => Some(Request::new(ServerOp::ListClients).serialize()),
            Self::Client => {
                let mut request = Request::new(ClientOp::Get);
                Some(request.add_path([3, 0, 15]).and_then(|()| request.serialize()))
            }
            Self::Bootstrap => None,
        }
    }
}

impl fmt::Display for DaemonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Server => "LWM2M Server",
            Self::Client => "LWM2M Client",
            Self::Bootstrap => "LWM2M Bootstrap Server",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerArgs {
    pub address: String,
    pub coap_port: u16,
    pub ipc_port: u16,
    pub log_file: PathBuf,
    pub content_type: ContentType,
}

#[derive(Debug, Clone)]
pub struct ClientArgs {
    pub coap_port: u16,
    pub ipc_port: u16,
    pub log_file: PathBuf,
    pub endpoint_name: String,
    pub bootstrap_config: PathBuf,
    /// Extra object definitions; `--objDefs` is omitted when `None`.
    pub object_definitions: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct BootstrapArgs {
    pub address: String,
    pub coap_port: u16,
    pub config_file: PathBuf,
    pub log_file: PathBuf,
}

fn path_arg(path: &FsPath) -> String {
    path.display().to_string()
}

/// Everything needed to start one daemon.
#[derive(Debug, Clone)]
pub struct DaemonSpec {
    kind: DaemonKind,
    binary: PathBuf,
    args: Vec<String>,
    ipc_port: Option<u16>,
}

impl DaemonSpec {
    pub fn server(args: &ServerArgs) -> Self {
        Self {
            kind: DaemonKind::Server,
            binary: DaemonKind::Server.binary(),
            args: vec![
                "--verbose".into(),
                "--ip".into(),
                args.address.clone(),
                "--port".into(),
                args.coap_port.to_string(),
                "--ipcPort".into(),
                args.ipc_port.to_string(),
                "--logFile".into(),
                path_arg(&args.log_file),
                "--contentType".into(),
                args.content_type.id().to_string(),
            ],
            ipc_port: Some(args.ipc_port),
        }
    }

    pub fn client(args: &ClientArgs) -> Self {
        let mut argv = vec![
            "--verbose".into(),
            "--port".into(),
            args.coap_port.to_string(),
            "--ipcPort".into(),
            args.ipc_port.to_string(),
            "--logFile".into(),
            path_arg(&args.log_file),
            "--endPointName".into(),
            args.endpoint_name.clone(),
            "--factoryBootstrap".into(),
            path_arg(&args.bootstrap_config),
        ];
        if let Some(defs) = &args.object_definitions {
            argv.push("--objDefs".into());
            argv.push(path_arg(defs));
        }
        Self {
            kind: DaemonKind::Client,
            binary: DaemonKind::Client.binary(),
            args: argv,
            ipc_port: Some(args.ipc_port),
        }
    }

    pub fn bootstrap(args: &BootstrapArgs) -> Self {
        Self {
            kind: DaemonKind::Bootstrap,
            binary: DaemonKind::Bootstrap.binary(),
            args: vec![
                "--verbose".into(),
                "--ip".into(),
                args.address.clone(),
                "--port".into(),
                args.coap_port.to_string(),
                "--config".into(),
                path_arg(&args.config_file),
                "--logfile".into(),
                path_arg(&args.log_file),
            ],
            ipc_port: None,
        }
    }

    /// Override the binary (instead of the environment / `PATH`).
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn kind(&self) -> DaemonKind {
        self.kind
    }

    pub fn binary(&self) -> &FsPath {
        &self.binary
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn ipc_port(&self) -> Option<u16> {
        self.ipc_port
    }
}

/// A spawned daemon. Dropping it terminates the process.
#[derive(Debug)]
pub struct Daemon {
    spec: DaemonSpec,
    child: Option<Child>,
}

impl Daemon {
    /// Start the process. A binary given as a path (rather than a bare name
    /// resolved through `PATH`) must exist.
    pub fn spawn(spec: DaemonSpec, silent: bool) -> Result<Self> {
        let binary = spec.binary();
        if binary.components().count() > 1 && !binary.is_file() {
            return Err(IpcError::Daemon(format!("{} not found", binary.display())));
        }

        let mut command = Command::new(binary);
        command.args(spec.args()).stdin(Stdio::null());
        if silent {
            command.stdout(Stdio::null());
        }
        let child = command
            .spawn()
            .map_err(|e| IpcError::Daemon(format!("failed to start {}: {}", binary.display(), e)))?;

        tracing::info!(kind = %spec.kind(), pid = child.id(), ipc_port = ?spec.ipc_port(), "daemon spawned");
        Ok(Self {
            spec,
            child: Some(child),
        })
    }

    pub fn spec(&self) -> &DaemonSpec {
        &self.spec
    }

    pub fn kind(&self) -> DaemonKind {
        self.spec.kind
    }

    /// `None` once the daemon has been signalled.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Whether the process is still alive (reaps it if it has exited).
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(Ok(Some(status))) => {
                tracing::warn!(kind = %self.spec.kind, %status, "daemon exited");
                self.child = None;
                false
            }
            Some(Err(_)) | None => false,
        }
    }

    /// Probe the daemon's IPC port until it answers.
    pub fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let kind = self.spec.kind;
        let (Some(port), Some(probe)) = (self.spec.ipc_port, kind.ready_probe()) else {
            return Ok(());
        };
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        wait_for_ipc(addr, timeout, &probe?).map_err(|e| match e {
            IpcError::Timeout(_) => IpcError::Timeout(format!("{} IPC timed out on port {}", kind, port)),
            other => other,
        })?;
        tracing::info!(%kind, pid = ?self.pid(), ipc_port = port, "daemon ready");
        Ok(())
    }

    /// SIGTERM, then consider the daemon gone.
    pub fn terminate(&mut self) {
        self.signal(libc::SIGTERM, "terminated");
    }

    /// SIGINT, then consider the daemon gone.
    pub fn interrupt(&mut self) {
        self.signal(libc::SIGINT, "interrupted");
    }

    /// SIGKILL.
    pub fn kill(&mut self) {
        self.signal(libc::SIGKILL, "killed");
    }

    fn signal(&mut self, signal: libc::c_int, action: &str) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        let pid = child.id();
        let Ok(raw) = libc::pid_t::try_from(pid) else {
            return;
        };
        // SAFETY: `raw` is the pid of a child we spawned and have not reaped.
        let rc = unsafe { libc::kill(raw, signal) };
        if rc != 0 {
            tracing::warn!(kind = %self.spec.kind, pid, error = %std::io::Error::last_os_error(), "signal failed");
        }
        reap(&mut child, EXIT_GRACE);
        tracing::info!(kind = %self.spec.kind, pid, "daemon {}", action);
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Wait up to `grace` for the child to exit so it does not linger as a zombie.
fn reap(child: &mut Child, grace: Duration) {
    let deadline = Instant::now() + grace;
    loop {
        match child.try_wait() {
            Ok(Some(_)) | Err(_) => return,
            Ok(None) if Instant::now() >= deadline => {
                tracing::warn!(pid = child.id(), "daemon still running after signal");
                return;
            }
            Ok(None) => std::thread::sleep(Duration::from_millis(10)),
        }
    }
}
