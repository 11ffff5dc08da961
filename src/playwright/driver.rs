//! Rust side of the Playwright driver: one Node child per run, JSON-line
//! commands multiplexed over its stdio.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tokio::time::timeout;
use tracing::debug;

use super::script::{
    ensure_node_available, ensure_playwright_available, map_driver_error, map_spawn_error,
    DRIVER_SCRIPT,
};
use crate::engine::{
    BrowserEngine, BrowsingContext, ContextOptions, EngineLauncher, Page, SelectorOutcome,
};
use crate::error::{Result, ShotError};

/// Default bound on driver startup (node spawn through Chromium ready).
pub const DEFAULT_LAUNCH_TIMEOUT: Duration = Duration::from_secs(45);

/// Default reply bound for commands that carry no page-side timeout.
pub const DEFAULT_COMMAND_GUARD: Duration = Duration::from_secs(60);

/// Extra slack granted on top of a command's own page-side timeout before
/// the driver is considered unresponsive.
const REPLY_GRACE: Duration = Duration::from_secs(10);

const SHUTDOWN_GUARD: Duration = Duration::from_secs(10);
const STDERR_TAIL_LINES: usize = 20;

/// Configuration for the Playwright engine.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// The Node.js command to use (default: "node").
    pub node_command: String,
    /// Whether to run Chromium in headless mode.
    pub headless: bool,
    /// Bound on driver startup.
    pub launch_timeout: Duration,
    /// Reply bound for commands without a page-side timeout.
    pub command_guard: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            node_command: "node".to_string(),
            headless: true,
            launch_timeout: DEFAULT_LAUNCH_TIMEOUT,
            command_guard: DEFAULT_COMMAND_GUARD,
        }
    }
}

/// Launches the production engine once per run.
#[derive(Debug, Clone, Default)]
pub struct PlaywrightLauncher {
    options: EngineOptions,
}

impl PlaywrightLauncher {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl EngineLauncher for PlaywrightLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserEngine>> {
        let engine = PlaywrightEngine::launch(self.options.clone()).await?;
        Ok(Box::new(engine))
    }
}

type DriverReply = std::result::Result<Value, String>;

/// Shared state between the engine, its contexts/pages, and the reader task.
struct DriverHandle {
    stdin: Mutex<ChildStdin>,
    pending: StdMutex<HashMap<u64, oneshot::Sender<DriverReply>>>,
    next_id: AtomicU64,
    closed: AtomicBool,
    fatal: StdMutex<Option<String>>,
    stderr_tail: StdMutex<VecDeque<String>>,
    command_guard: Duration,
}

impl DriverHandle {
    /// Message used when the child goes away: the script's fatal report if
    /// one arrived, otherwise the stderr tail.
    fn exit_message(&self) -> String {
        if let Some(fatal) = self.fatal.lock().unwrap().clone() {
            return fatal;
        }
        let tail = self.stderr_tail.lock().unwrap();
        if tail.is_empty() {
            "browser driver exited unexpectedly".to_string()
        } else {
            format!(
                "browser driver exited unexpectedly: {}",
                tail.iter().cloned().collect::<Vec<_>>().join(" | ")
            )
        }
    }

    /// Send one command and await its reply. `guard` bounds the wait;
    /// `None` waits until the driver answers or exits.
    async fn command(&self, op: &str, params: Value, guard: Option<Duration>) -> Result<Value> {
        if self.closed.load(Ordering::Acquire) {
            return Err(map_driver_error(&self.exit_message()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(id, tx);

        let line = serde_json::to_string(&json!({ "id": id, "op": op, "params": params }))?;
        let write_result = {
            let mut stdin = self.stdin.lock().await;
            async {
                stdin.write_all(line.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
                stdin.flush().await
            }
            .await
        };
        if let Err(err) = write_result {
            self.pending.lock().unwrap().remove(&id);
            return Err(ShotError::browser(format!(
                "failed to send {} to browser driver: {}",
                op, err
            )));
        }

        let reply = match guard {
            Some(limit) => match timeout(limit, rx).await {
                Ok(reply) => reply,
                Err(_) => {
                    self.pending.lock().unwrap().remove(&id);
                    return Err(ShotError::browser(format!(
                        "browser driver did not answer {} within {:?}",
                        op, limit
                    )));
                }
            },
            None => rx.await,
        };

        match reply {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(map_driver_error(&message)),
            Err(_) => Err(map_driver_error(&self.exit_message())),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct DriverLine {
    id: Option<u64>,
    #[serde(default)]
    ok: bool,
    result: Option<Value>,
    error: Option<String>,
    event: Option<String>,
}

async fn read_driver_output(
    handle: Arc<DriverHandle>,
    stdout: ChildStdout,
    ready: oneshot::Sender<std::result::Result<(), String>>,
) {
    let mut ready = Some(ready);
    let mut lines = BufReader::new(stdout).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let parsed: DriverLine = match serde_json::from_str(&line) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(target: "gridshot::driver", %line, %err, "unparseable driver output");
                continue;
            }
        };

        if let Some(event) = parsed.event.as_deref() {
            match event {
                "ready" => {
                    if let Some(tx) = ready.take() {
                        let _ = tx.send(Ok(()));
                    }
                }
                "fatal" => {
                    let message = parsed.error.unwrap_or_else(|| "unknown fatal error".into());
                    *handle.fatal.lock().unwrap() = Some(message);
                }
                _ => {
                    debug!(target: "gridshot::driver", event, error = ?parsed.error, "driver event");
                }
            }
            continue;
        }

        if let Some(id) = parsed.id {
            let sender = handle.pending.lock().unwrap().remove(&id);
            if let Some(tx) = sender {
                let reply = if parsed.ok {
                    Ok(parsed.result.unwrap_or(Value::Null))
                } else {
                    Err(parsed.error.unwrap_or_else(|| "unknown driver error".into()))
                };
                let _ = tx.send(reply);
            }
        }
    }

    // Child stdout closed: the driver is gone. Fail everything in flight
    // and everything that arrives later.
    handle.closed.store(true, Ordering::Release);
    let message = handle.exit_message();
    if let Some(tx) = ready.take() {
        let _ = tx.send(Err(message.clone()));
    }
    let senders: Vec<_> = handle.pending.lock().unwrap().drain().collect();
    for (_, tx) in senders {
        let _ = tx.send(Err(message.clone()));
    }
}

async fn read_driver_stderr(handle: Arc<DriverHandle>, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(target: "gridshot::driver", "stderr: {line}");
        let mut tail = handle.stderr_tail.lock().unwrap();
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
}

/// The production browser engine: one Chromium shared by the whole run,
/// with per-task isolated contexts served by the driver child.
pub struct PlaywrightEngine {
    driver: Arc<DriverHandle>,
    child: Mutex<Child>,
}

impl PlaywrightEngine {
    pub async fn launch(options: EngineOptions) -> Result<Self> {
        ensure_node_available(&options.node_command).await?;
        ensure_playwright_available(&options.node_command).await?;

        let mut cmd = Command::new(&options.node_command);
        cmd.arg("-e")
            .arg(DRIVER_SCRIPT)
            .arg(if options.headless { "1" } else { "0" })
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|err| map_spawn_error(err, &options.node_command))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ShotError::browser("browser driver stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ShotError::browser("browser driver stdout unavailable"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ShotError::browser("browser driver stderr unavailable"))?;

        let driver = Arc::new(DriverHandle {
            stdin: Mutex::new(stdin),
            pending: StdMutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            fatal: StdMutex::new(None),
            stderr_tail: StdMutex::new(VecDeque::new()),
            command_guard: options.command_guard,
        });

        let (ready_tx, ready_rx) = oneshot::channel();
        tokio::spawn(read_driver_output(driver.clone(), stdout, ready_tx));
        tokio::spawn(read_driver_stderr(driver.clone(), stderr));

        match timeout(options.launch_timeout, ready_rx).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(message))) => {
                let _ = child.kill().await;
                return Err(map_driver_error(&message));
            }
            Ok(Err(_)) => {
                let _ = child.kill().await;
                return Err(ShotError::browser("browser driver exited before becoming ready"));
            }
            Err(_) => {
                let _ = child.kill().await;
                return Err(ShotError::browser(format!(
                    "Browser driver timed out after {:?} while starting",
                    options.launch_timeout
                )));
            }
        }

        Ok(Self {
            driver,
            child: Mutex::new(child),
        })
    }
}

#[async_trait]
impl BrowserEngine for PlaywrightEngine {
    async fn new_context(&self, options: ContextOptions) -> Result<Box<dyn BrowsingContext>> {
        let reply = self
            .driver
            .command(
                "newContext",
                json!({
                    "width": options.viewport.width,
                    "height": options.viewport.height,
                    "userAgent": options.user_agent,
                }),
                Some(self.driver.command_guard),
            )
            .await?;
        let context_id = string_field(&reply, "contextId")?;
        Ok(Box::new(PlaywrightContext {
            driver: self.driver.clone(),
            context_id,
        }))
    }

    async fn close(&self) -> Result<()> {
        // Best effort: the driver closes the browser and exits on its own.
        let _ = self
            .driver
            .command("shutdown", json!({}), Some(SHUTDOWN_GUARD))
            .await;

        let mut child = self.child.lock().await;
        match timeout(Duration::from_secs(5), child.wait()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(ShotError::Io(err)),
            Err(_) => {
                child.kill().await.map_err(ShotError::Io)?;
                Ok(())
            }
        }
    }
}

struct PlaywrightContext {
    driver: Arc<DriverHandle>,
    context_id: String,
}

#[async_trait]
impl BrowsingContext for PlaywrightContext {
    async fn new_page(&self) -> Result<Box<dyn Page>> {
        let reply = self
            .driver
            .command(
                "newPage",
                json!({ "contextId": self.context_id }),
                Some(self.driver.command_guard),
            )
            .await?;
        let page_id = string_field(&reply, "pageId")?;
        Ok(Box::new(PlaywrightPage {
            driver: self.driver.clone(),
            page_id,
        }))
    }

    async fn close(&self) -> Result<()> {
        self.driver
            .command(
                "closeContext",
                json!({ "contextId": self.context_id }),
                Some(self.driver.command_guard),
            )
            .await?;
        Ok(())
    }
}

struct PlaywrightPage {
    driver: Arc<DriverHandle>,
    page_id: String,
}

#[async_trait]
impl Page for PlaywrightPage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        self.driver
            .command(
                "goto",
                json!({
                    "pageId": self.page_id,
                    "url": url,
                    "timeoutMs": timeout.as_millis() as u64,
                }),
                Some(timeout + REPLY_GRACE),
            )
            .await?;
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<SelectorOutcome> {
        let reply = self
            .driver
            .command(
                "waitForSelector",
                json!({
                    "pageId": self.page_id,
                    "selector": selector,
                    "timeoutMs": timeout.as_millis() as u64,
                }),
                Some(timeout + REPLY_GRACE),
            )
            .await?;
        let found = reply
            .get("found")
            .and_then(Value::as_bool)
            .ok_or_else(|| ShotError::browser("driver reply missing found flag"))?;
        Ok(if found {
            SelectorOutcome::Found
        } else {
            SelectorOutcome::NotFound
        })
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.driver
            .command(
                "click",
                json!({ "pageId": self.page_id, "selector": selector }),
                Some(self.driver.command_guard),
            )
            .await?;
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        let reply = self
            .driver
            .command(
                "evaluate",
                json!({ "pageId": self.page_id, "expression": expression }),
                Some(self.driver.command_guard),
            )
            .await?;
        Ok(reply.get("value").cloned().unwrap_or(Value::Null))
    }

    async fn wait_for_network_idle(&self, timeout: Option<Duration>) -> Result<()> {
        // Playwright treats 0 as "no timeout"; an unbounded wait also gets
        // no reply guard and resolves only when the driver answers or dies.
        let timeout_ms = timeout.map(|t| t.as_millis() as u64).unwrap_or(0);
        self.driver
            .command(
                "waitForLoadState",
                json!({ "pageId": self.page_id, "timeoutMs": timeout_ms }),
                timeout.map(|t| t + REPLY_GRACE),
            )
            .await?;
        Ok(())
    }

    async fn screenshot_full_page(&self, path: &Path, timeout: Duration) -> Result<()> {
        self.driver
            .command(
                "screenshot",
                json!({
                    "pageId": self.page_id,
                    "path": path.to_string_lossy(),
                    "timeoutMs": timeout.as_millis() as u64,
                }),
                Some(timeout + REPLY_GRACE),
            )
            .await?;
        Ok(())
    }
}

fn string_field(reply: &Value, field: &str) -> Result<String> {
    reply
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ShotError::browser(format!("driver reply missing {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_options_default_values() {
        let opts = EngineOptions::default();
        assert_eq!(opts.node_command, "node");
        assert!(opts.headless);
        assert_eq!(opts.launch_timeout, DEFAULT_LAUNCH_TIMEOUT);
        assert_eq!(opts.command_guard, DEFAULT_COMMAND_GUARD);
    }

    #[tokio::test]
    async fn launch_fails_for_missing_binary() {
        let result = PlaywrightEngine::launch(EngineOptions {
            node_command: "definitely-not-a-binary".to_string(),
            ..EngineOptions::default()
        })
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn launcher_propagates_launch_failure() {
        let launcher = PlaywrightLauncher::new(EngineOptions {
            node_command: "definitely-not-a-binary".to_string(),
            ..EngineOptions::default()
        });
        assert!(launcher.launch().await.is_err());
    }

    #[test]
    fn driver_line_parses_reply() {
        let line: DriverLine =
            serde_json::from_str(r#"{"id": 3, "ok": true, "result": {"contextId": "ctx-0"}}"#)
                .unwrap();
        assert_eq!(line.id, Some(3));
        assert!(line.ok);
        assert_eq!(line.result.unwrap()["contextId"], "ctx-0");
    }

    #[test]
    fn driver_line_parses_event() {
        let line: DriverLine = serde_json::from_str(r#"{"event": "ready"}"#).unwrap();
        assert_eq!(line.event.as_deref(), Some("ready"));
        assert!(line.id.is_none());
    }

    #[test]
    fn driver_line_parses_error_reply() {
        let line: DriverLine = serde_json::from_str(
            r#"{"id": 9, "ok": false, "error": "Timeout 30000ms exceeded"}"#,
        )
        .unwrap();
        assert_eq!(line.id, Some(9));
        assert!(!line.ok);
        assert_eq!(line.error.as_deref(), Some("Timeout 30000ms exceeded"));
    }

    #[test]
    fn string_field_rejects_missing_key() {
        let reply = json!({ "other": "x" });
        assert!(string_field(&reply, "contextId").is_err());
    }
}
