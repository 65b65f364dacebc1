use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Process-environment overrides for one test. Holds the global env lock for
/// its lifetime and restores every touched variable on drop, newest first.
pub(crate) struct EnvScope {
    saved: Vec<(&'static str, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvScope {
    pub(crate) fn new() -> Self {
        let lock = env_lock()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Self {
            saved: Vec::new(),
            _lock: lock,
        }
    }

    pub(crate) fn set(mut self, key: &'static str, value: &str) -> Self {
        self.saved.push((key, std::env::var(key).ok()));
        std::env::set_var(key, value);
        self
    }

    pub(crate) fn unset(mut self, key: &'static str) -> Self {
        self.saved.push((key, std::env::var(key).ok()));
        std::env::remove_var(key);
        self
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        for (key, original) in self.saved.drain(..).rev() {
            match original {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

/// In-memory sink for log lines emitted on the current thread.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub(crate) fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&buf).lines().map(str::to_owned).collect()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn env_scope_restores_previous_values() {
    {
        let _env = EnvScope::new().set("AUTOVOTE_SCOPE_CHECK", "outer");
    }
    assert!(std::env::var("AUTOVOTE_SCOPE_CHECK").is_err());

    let _env = EnvScope::new()
        .set("AUTOVOTE_SCOPE_CHECK", "first")
        .set("AUTOVOTE_SCOPE_CHECK", "second");
    assert_eq!(std::env::var("AUTOVOTE_SCOPE_CHECK").unwrap(), "second");
    drop(_env);
    assert!(std::env::var("AUTOVOTE_SCOPE_CHECK").is_err());
}
