use async_trait::async_trait;
use ferry_upload::{Hook, HookContext};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Shared, ordered record of hook invocations
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Hook that appends its name to a log and optionally fails
pub struct RecordingHook {
    pub name: String,
    pub log: CallLog,
    pub error: Option<String>,
}

impl RecordingHook {
    pub fn ok(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            error: None,
        }
    }

    pub fn failing(name: &str, log: &CallLog, error: &str) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            error: Some(error.to_string()),
        }
    }
}

#[async_trait]
impl Hook for RecordingHook {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, ctx: &HookContext) -> anyhow::Result<()> {
        let entry = match &ctx.destination {
            Some(destination) => format!("{}@{}", self.name, destination),
            None => self.name.clone(),
        };
        self.log.lock().unwrap().push(entry);

        match &self.error {
            Some(error) => anyhow::bail!("{}", error),
            None => Ok(()),
        }
    }
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Hook that records its entry, then holds until released
pub struct BlockingHook {
    pub inner: RecordingHook,
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl BlockingHook {
    pub fn new(inner: RecordingHook) -> Self {
        Self {
            inner,
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl Hook for BlockingHook {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn call(&self, ctx: &HookContext) -> anyhow::Result<()> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.call(ctx).await
    }
}

/// Wait until `entry` shows up in the log.
pub async fn wait_for_entry(log: &CallLog, entry: &str) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !entries(log).iter().any(|e| e == entry) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("{} never logged, got {:?}", entry, entries(log)));
}
