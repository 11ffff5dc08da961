//! The embedded Node.js driver script, availability checks, and error
//! mapping for the Playwright engine.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{Result, ShotError};

/// Long-lived Playwright driver.
///
/// Launches one Chromium instance, then serves newline-delimited JSON
/// commands on stdin. Every reply carries the command id, so commands from
/// interleaved capture tasks can be in flight concurrently. `timeout: 0`
/// follows the Playwright convention of disabling the bound.
pub(crate) const DRIVER_SCRIPT: &str = r#"
const readline = require('readline');

const [, headlessFlag] = process.argv;

function send(payload) {
  process.stdout.write(JSON.stringify(payload) + '\n');
}

async function main() {
  const { chromium } = require('playwright');
  const browser = await chromium.launch({ headless: headlessFlag !== '0' });

  const contexts = new Map();
  const pages = new Map();
  let nextContext = 0;
  let nextPage = 0;

  const pageOf = (params) => {
    const entry = pages.get(params.pageId);
    if (!entry) throw new Error(`unknown page ${params.pageId}`);
    return entry.page;
  };

  const handlers = {
    async newContext(params) {
      const options = { viewport: { width: params.width, height: params.height } };
      if (params.userAgent) {
        options.userAgent = params.userAgent;
      }
      const context = await browser.newContext(options);
      const contextId = `ctx-${nextContext++}`;
      contexts.set(contextId, context);
      return { contextId };
    },
    async newPage(params) {
      const context = contexts.get(params.contextId);
      if (!context) throw new Error(`unknown context ${params.contextId}`);
      const page = await context.newPage();
      const pageId = `page-${nextPage++}`;
      pages.set(pageId, { page, contextId: params.contextId });
      return { pageId };
    },
    async goto(params) {
      await pageOf(params).goto(params.url, { waitUntil: 'networkidle', timeout: params.timeoutMs });
      return {};
    },
    async waitForSelector(params) {
      try {
        await pageOf(params).waitForSelector(params.selector, { state: 'visible', timeout: params.timeoutMs });
        return { found: true };
      } catch (err) {
        if (err && err.name === 'TimeoutError') {
          return { found: false };
        }
        throw err;
      }
    },
    async click(params) {
      await pageOf(params).click(params.selector);
      return {};
    },
    async evaluate(params) {
      const value = await pageOf(params).evaluate(params.expression);
      return { value: value === undefined ? null : value };
    },
    async waitForLoadState(params) {
      await pageOf(params).waitForLoadState('networkidle', { timeout: params.timeoutMs });
      return {};
    },
    async screenshot(params) {
      await pageOf(params).screenshot({ path: params.path, fullPage: true, type: 'png', timeout: params.timeoutMs });
      return {};
    },
    async closeContext(params) {
      const context = contexts.get(params.contextId);
      if (!context) return {};
      contexts.delete(params.contextId);
      for (const [pageId, entry] of pages) {
        if (entry.contextId === params.contextId) {
          pages.delete(pageId);
        }
      }
      await context.close();
      return {};
    },
    async shutdown() {
      await browser.close();
      setImmediate(() => process.exit(0));
      return {};
    }
  };

  const rl = readline.createInterface({ input: process.stdin });
  rl.on('line', (line) => {
    if (!line.trim()) return;
    let command;
    try {
      command = JSON.parse(line);
    } catch (err) {
      send({ event: 'protocol-error', error: String(err) });
      return;
    }
    const handler = handlers[command.op];
    if (!handler) {
      send({ id: command.id, ok: false, error: `unknown op ${command.op}` });
      return;
    }
    handler(command.params || {}).then(
      (result) => send({ id: command.id, ok: true, result }),
      (err) => send({ id: command.id, ok: false, error: err && err.message ? err.message : String(err) })
    );
  });
  rl.on('close', async () => {
    try { await browser.close(); } catch (err) {}
    process.exit(0);
  });

  send({ event: 'ready' });
}

main().catch((err) => {
  send({ event: 'fatal', error: err && err.message ? err.message : String(err) });
  process.exit(1);
});
"#;

/// Timeout for checking node/playwright availability.
pub(crate) const NODE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Script to check if Playwright is installed.
const PLAYWRIGHT_CHECK_SCRIPT: &str = "require('playwright'); process.stdout.write('ok');";

/// Maps a spawn error to an appropriate ShotError.
pub(crate) fn map_spawn_error(err: io::Error, command: &str) -> ShotError {
    if err.kind() == io::ErrorKind::NotFound {
        ShotError::browser(format!(
            "Unable to spawn browser driver; '{}' was not found on PATH",
            command
        ))
    } else {
        ShotError::Io(err)
    }
}

/// Maps an error message reported by the driver to an appropriate ShotError.
pub(crate) fn map_driver_error(message: &str) -> ShotError {
    let lower = message.to_ascii_lowercase();

    if lower.contains("cannot find module 'playwright'") {
        return ShotError::browser(
            "Playwright npm package is missing; install with `npm install playwright`.",
        );
    }

    if lower.contains("executable doesn't exist") || lower.contains("browsertype.launch") {
        return ShotError::browser(format!(
            "chromium executable is missing or broken: {}",
            message
        ));
    }

    ShotError::browser(message.to_string())
}

/// Ensures Node.js is available on the system.
pub(crate) async fn ensure_node_available(node_command: &str) -> Result<()> {
    let mut cmd = Command::new(node_command);
    cmd.arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let status = tokio::time::timeout(NODE_CHECK_TIMEOUT, cmd.status())
        .await
        .map_err(|_| {
            ShotError::browser(format!(
                "Timed out checking node availability after {:?}",
                NODE_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !status.success() {
        return Err(ShotError::browser(format!(
            "Node command {:?} is not available (exit {})",
            node_command, status
        )));
    }

    Ok(())
}

/// Ensures the Playwright npm package is installed.
pub(crate) async fn ensure_playwright_available(node_command: &str) -> Result<()> {
    let mut cmd = Command::new(node_command);
    cmd.arg("-e")
        .arg(PLAYWRIGHT_CHECK_SCRIPT)
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let output = tokio::time::timeout(NODE_CHECK_TIMEOUT, cmd.output())
        .await
        .map_err(|_| {
            ShotError::browser(format!(
                "Timed out checking Playwright availability after {:?}",
                NODE_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(map_driver_error(&stderr));
    }

    Ok(())
}
