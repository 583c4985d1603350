//! Session creation, attachment, and lifecycle binding.
//!
//! A [`Session`] is the shared, reference-counted runtime state behind
//! every protocol operation: the connection (writer/dispatcher tasks and
//! registries), the supervised browser process, the target registry, and
//! the cancellation scope the whole tree hangs off.
//!
//! # Session Tree
//!
//! - [`Session::launch`] creates the **root**: output directory, browser
//!   process, transport tasks, target discovery, first page attachment.
//! - [`Session::derive`] creates a **child**: shares everything by
//!   reference, opens a fresh tab, attaches to it, and lives under a child
//!   cancellation token. Cancelling a child releases only that child's
//!   in-flight commands; cancelling the root tears down the process and
//!   transport for the whole tree.
//!
//! # Example
//!
//! ```no_run
//! use chrome_devtools::{ChromeOptions, LaunchConfig, Session};
//!
//! # async fn example() -> chrome_devtools::Result<()> {
//! let config = LaunchConfig::builder()
//!     .binary("/usr/bin/chromium")
//!     .options(ChromeOptions::headless())
//!     .build()?;
//!
//! let session = Session::launch(config).await?;
//! let version = session.execute_browser("Browser.getVersion", None).await?;
//! println!("{version}");
//!
//! let tab = session.derive().await?;
//! tab.execute("Page.enable", None).await?;
//!
//! session.close();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::{SessionId, TargetId};
use crate::launcher::output::{OutputDir, WireLog};
use crate::launcher::process::BrowserProcess;
use crate::launcher::{ChromeOptions, LaunchConfig};
use crate::protocol::target::{
    ATTACH_TO_TARGET, AttachToTargetResult, CREATE_TARGET, CreateTargetResult,
    SET_DISCOVER_TARGETS, TARGET_CREATED, TARGET_DESTROYED, TARGET_INFO_CHANGED, TargetInfo,
};
use crate::transport::{Connection, EventStream, TransportRx, TransportTx, pipe, websocket};

use super::targets::{TargetRegistry, spawn_target_watcher};

// ============================================================================
// Constants
// ============================================================================

/// How long session creation waits for a page target to discover.
const ATTACH_TIMEOUT: Duration = Duration::from_secs(10);

/// URL a derived session's fresh tab opens on.
const BLANK_PAGE: &str = "about:blank";

// ============================================================================
// Attachment
// ============================================================================

/// The target/session pair a session is attached to.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// The attached target (tab).
    pub target_id: TargetId,
    /// The tag routing this session's commands to that target.
    pub session_id: SessionId,
}

// ============================================================================
// Types
// ============================================================================

/// State shared by every session in one tree.
pub(crate) struct SessionInner {
    /// Transport handle (writer queue, registries, id counter).
    connection: Connection,
    /// Supervised browser process; `None` for remote connections.
    process: Option<BrowserProcess>,
    /// Per-run output directory; `None` for bare stub transports.
    output: Option<OutputDir>,
    /// Shared view of the browser's targets.
    targets: Arc<TargetRegistry>,
}

// ============================================================================
// Session
// ============================================================================

/// Handle to a protocol session.
///
/// Cloning shares the same scope and attachment; [`Session::derive`]
/// creates a sibling with its own tab and child scope.
#[derive(Clone)]
pub struct Session {
    /// Shared tree state.
    inner: Arc<SessionInner>,
    /// This session's cancellation scope.
    scope: CancellationToken,
    /// This session's attached tab, if attachment succeeded.
    attachment: Option<Attachment>,
    /// Whether `scope` is the tree's root token.
    is_root: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("root", &self.is_root)
            .field("attachment", &self.attachment)
            .field("targets", &self.inner.targets.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Session - Creation
// ============================================================================

impl Session {
    /// Launches a browser and creates the root session over its pipe.
    ///
    /// Creates the output directory, spawns the process, starts the
    /// writer/dispatcher tasks, enables target discovery, and attaches to
    /// the first page target. Discovery or attachment trouble degrades the
    /// session (browser-scope commands only) with a warning; it does not
    /// abort creation.
    ///
    /// # Errors
    ///
    /// - [`Error::OutputDir`] if the output directory cannot be created
    /// - [`Error::ProcessLaunchFailed`] if the browser fails to start
    ///
    /// Both are fatal; nothing is retried.
    pub async fn launch(config: LaunchConfig) -> Result<Self> {
        let output = OutputDir::create()?;
        let wire_log = output.wire_log()?;

        let spawned = BrowserProcess::spawn(&config, &output)?;
        let (transport_tx, transport_rx) = pipe::pipe(spawned.stdin, spawned.stdout);
        let connection = Connection::spawn(transport_tx, transport_rx, wire_log);

        let root = CancellationToken::new();
        Self::bind_lifecycle(&connection, &spawned.process, &root);

        Ok(Self::bootstrap(connection, Some(spawned.process), Some(output), root).await)
    }

    /// Creates the root session over an already-running browser's
    /// WebSocket endpoint.
    ///
    /// No process is supervised; cancelling the root scope closes the
    /// transport.
    ///
    /// # Errors
    ///
    /// - [`Error::OutputDir`] if the output directory cannot be created
    /// - [`Error::Config`] / [`Error::WebSocket`] if the endpoint is bad
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let output = OutputDir::create()?;
        let wire_log = output.wire_log()?;

        let (transport_tx, transport_rx) = websocket::connect(endpoint).await?;
        let connection = Connection::spawn(transport_tx, transport_rx, wire_log);

        let root = CancellationToken::new();
        {
            let connection = connection.clone();
            let root = root.clone();
            tokio::spawn(async move {
                root.cancelled().await;
                connection.shutdown();
            });
        }

        Ok(Self::bootstrap(connection, None, Some(output), root).await)
    }

    /// Creates the root session over an arbitrary transport pair.
    ///
    /// Intended for stub transports in tests and benchmarks; the remote
    /// end must speak the envelope protocol (including the `Target`
    /// domain, or the session comes up degraded after the discovery
    /// timeout).
    pub async fn over_transport<T, R>(
        transport_tx: T,
        transport_rx: R,
        wire_log: WireLog,
    ) -> Self
    where
        T: TransportTx + 'static,
        R: TransportRx + 'static,
    {
        let connection = Connection::spawn(transport_tx, transport_rx, wire_log);

        let root = CancellationToken::new();
        {
            let connection = connection.clone();
            let root = root.clone();
            tokio::spawn(async move {
                root.cancelled().await;
                connection.shutdown();
            });
        }

        Self::bootstrap(connection, None, None, root).await
    }

    /// Shared tail of root-session creation: discovery and attachment.
    async fn bootstrap(
        connection: Connection,
        process: Option<BrowserProcess>,
        output: Option<OutputDir>,
        root: CancellationToken,
    ) -> Self {
        let targets = Arc::new(TargetRegistry::new());

        // Subscribe to the lifecycle events before enabling discovery so
        // the initial burst of targetCreated events cannot be missed.
        let created = connection.subscribe(TARGET_CREATED);
        let info_changed = connection.subscribe(TARGET_INFO_CHANGED);
        let destroyed = connection.subscribe(TARGET_DESTROYED);
        spawn_target_watcher(
            Arc::clone(&targets),
            created,
            info_changed,
            destroyed,
            root.clone(),
        );

        let inner = Arc::new(SessionInner {
            connection,
            process,
            output,
            targets,
        });
        let mut session = Self {
            inner,
            scope: root,
            attachment: None,
            is_root: true,
        };

        // Discovery and first attachment are best-effort: failure leaves
        // the session usable for browser-scope commands.
        let discovery = session
            .inner
            .connection
            .execute(
                SET_DISCOVER_TARGETS,
                Some(json!({"discover": true})),
                None,
                &session.scope,
            )
            .await;

        match discovery {
            Err(e) => warn!(error = %e, "Target discovery setup failed; session degraded"),
            Ok(_) => match session.attach_first_page().await {
                Ok(attachment) => {
                    info!(
                        target = %attachment.target_id,
                        session = %attachment.session_id,
                        "Attached to page target"
                    );
                    session.attachment = Some(attachment);
                }
                Err(e) => warn!(error = %e, "Page attachment failed; session degraded"),
            },
        }

        Self::spawn_scope_watcher(session.scope.clone(), session.is_root);
        session
    }

    /// Derives a child session: fresh tab, fresh attachment, child scope.
    ///
    /// The child shares the transport, registries, process, and target
    /// registry with its parent; only the tab is its own. The parent's
    /// session tag is never reused.
    ///
    /// # Errors
    ///
    /// Returns any error from `Target.createTarget` or
    /// `Target.attachToTarget`; a child without its own tab would be
    /// indistinguishable from its parent, so there is no degraded variant.
    pub async fn derive(&self) -> Result<Self> {
        let scope = self.scope.child_token();
        let mut child = Self {
            inner: Arc::clone(&self.inner),
            scope,
            attachment: None,
            is_root: false,
        };

        let created = child
            .inner
            .connection
            .execute(
                CREATE_TARGET,
                Some(json!({"url": BLANK_PAGE})),
                None,
                &child.scope,
            )
            .await?;
        let created: CreateTargetResult = serde_json::from_value(created)
            .map_err(|e| Error::unexpected_response(format!("createTarget result: {e}")))?;

        let attachment = child.attach_to(created.target_id).await?;
        info!(
            target = %attachment.target_id,
            session = %attachment.session_id,
            "Derived session attached to new tab"
        );
        child.attachment = Some(attachment);

        Self::spawn_scope_watcher(child.scope.clone(), child.is_root);
        Ok(child)
    }
}

// ============================================================================
// Session - Attachment
// ============================================================================

impl Session {
    /// Waits for an unattached page target and attaches to it.
    async fn attach_first_page(&self) -> Result<Attachment> {
        let target_id = self
            .inner
            .targets
            .wait_for_unattached_page(ATTACH_TIMEOUT)
            .await?;
        self.attach_to(target_id).await
    }

    /// Attaches to a target in flattened mode and records the tag.
    async fn attach_to(&self, target_id: TargetId) -> Result<Attachment> {
        let result = self
            .inner
            .connection
            .execute(
                ATTACH_TO_TARGET,
                Some(json!({"targetId": target_id.as_str(), "flatten": true})),
                None,
                &self.scope,
            )
            .await?;

        let attach: AttachToTargetResult = serde_json::from_value(result)
            .map_err(|e| Error::unexpected_response(format!("attachToTarget result: {e}")))?;

        self.inner.targets.mark_attached(&target_id);
        Ok(Attachment {
            target_id,
            session_id: attach.session_id,
        })
    }
}

// ============================================================================
// Session - Lifecycle
// ============================================================================

impl Session {
    /// Ties session teardown to the process and vice versa: the browser
    /// exiting cancels the root scope, and root cancellation terminates
    /// the browser. Either way the writer task is shut down.
    fn bind_lifecycle(
        connection: &Connection,
        process: &BrowserProcess,
        root: &CancellationToken,
    ) {
        let connection = connection.clone();
        let exit = process.exit_signal();
        let kill = process.kill_token();
        let root = root.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = exit.cancelled() => {
                    info!("Browser exited; tearing down session tree");
                    root.cancel();
                }
                _ = root.cancelled() => {
                    debug!("Root scope cancelled; terminating browser");
                    kill.cancel();
                }
            }
            connection.shutdown();
        });
    }

    /// Logs when a session's scope ends.
    fn spawn_scope_watcher(scope: CancellationToken, is_root: bool) {
        tokio::spawn(async move {
            scope.cancelled().await;
            if is_root {
                info!("Root session scope ended");
            } else {
                debug!("Derived session scope ended");
            }
        });
    }

    /// Cancels this session's scope.
    ///
    /// On the root session this tears down the browser process and the
    /// transport, failing every in-flight command in the tree. On a
    /// derived session it releases only that session's own in-flight
    /// commands; siblings and the shared transport are untouched.
    pub fn close(&self) {
        self.scope.cancel();
    }
}

// ============================================================================
// Session - Protocol Operations
// ============================================================================

impl Session {
    /// Invokes a method against this session's attached tab.
    ///
    /// The envelope carries this session's tag; on a degraded session
    /// (no attachment) the command goes out untagged, at browser scope.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] if the browser answered with an error
    /// - [`Error::ConnectionClosed`] if the transport closed first
    /// - [`Error::Cancelled`] if this session's scope was cancelled first
    pub async fn execute(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let session_id = self
            .attachment
            .as_ref()
            .map(|attachment| attachment.session_id.clone());
        self.inner
            .connection
            .execute(method, params, session_id, &self.scope)
            .await
    }

    /// Invokes a browser-scope method (untagged envelope).
    ///
    /// Use for `Target.*`, `Browser.*` and other commands that address
    /// the browser rather than a tab.
    ///
    /// # Errors
    ///
    /// Same as [`Session::execute`].
    pub async fn execute_browser(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.inner
            .connection
            .execute(method, params, None, &self.scope)
            .await
    }

    /// Subscribes to all events with the given method name.
    ///
    /// Subscribers on the same session tree share the dispatch registry:
    /// each gets an independent copy of every matching envelope, in
    /// dispatch order. Dropping the stream unsubscribes.
    pub fn subscribe(&self, method: impl Into<String>) -> EventStream {
        self.inner.connection.subscribe(method)
    }
}

// ============================================================================
// Session - Accessors
// ============================================================================

impl Session {
    /// Returns this session's attachment, if any.
    #[inline]
    #[must_use]
    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    /// Returns a snapshot of the browser's known targets.
    #[must_use]
    pub fn targets(&self) -> Vec<TargetInfo> {
        self.inner.targets.snapshot()
    }

    /// Returns a clone of this session's cancellation scope.
    #[inline]
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.scope.clone()
    }

    /// Returns `true` if this handle owns the tree's root scope.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Returns the per-run output directory, if this tree has one.
    #[must_use]
    pub fn output_dir(&self) -> Option<&Path> {
        self.inner.output.as_ref().map(OutputDir::path)
    }

    /// Returns the supervised browser's pid, if this tree launched one.
    #[must_use]
    pub fn browser_pid(&self) -> Option<u32> {
        self.inner.process.as_ref().map(BrowserProcess::pid)
    }

    /// Returns the number of commands awaiting a response tree-wide.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.connection.pending_count()
    }

    /// Builds a headless launch configuration for the given binary.
    ///
    /// Shorthand for the common case; see [`LaunchConfig::builder`] for
    /// full control.
    ///
    /// # Errors
    ///
    /// Same as [`LaunchConfigBuilder::build`](crate::LaunchConfigBuilder::build).
    pub fn headless_config(binary: impl Into<std::path::PathBuf>) -> Result<LaunchConfig> {
        LaunchConfig::builder()
            .binary(binary)
            .options(ChromeOptions::headless())
            .build()
    }
}
