use std::ffi::OsString;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static HOME_LOCK: Mutex<()> = Mutex::new(());

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a thread-local subscriber and returns its result together
/// with every event it logged.
pub(crate) fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    let out = tracing::subscriber::with_default(subscriber, f);
    let logged = String::from_utf8_lossy(&capture.0.lock().unwrap()).into_owned();
    (out, logged)
}

/// Serializes tests that read or override `HOME`.
pub(crate) fn lock_home() -> MutexGuard<'static, ()> {
    HOME_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

struct RestoreHome(Option<OsString>);

impl Drop for RestoreHome {
    fn drop(&mut self) {
        match self.0.take() {
            Some(home) => std::env::set_var("HOME", home),
            None => std::env::remove_var("HOME"),
        }
    }
}

/// Runs `f` with `HOME` set to `home`, restoring the previous value after.
pub(crate) fn with_home<T>(home: &str, f: impl FnOnce() -> T) -> T {
    let _lock = lock_home();
    let _restore = RestoreHome(std::env::var_os("HOME"));
    std::env::set_var("HOME", home);
    f()
}
