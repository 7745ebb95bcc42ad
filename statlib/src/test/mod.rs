mod sweep_tests;

use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use crate::histogram::{Buckets, Histogram};

/// Boundaries `[0, 1, 2, 4]` with counts `[10, 5, 3, 2]`, 20 accesses in total
pub(crate) fn small_histogram() -> Histogram {
    histogram(&[0, 1, 2, 4], &[10, 5, 3, 2])
}

pub(crate) fn histogram(boundaries: &[u64], counts: &[u64]) -> Histogram {
    let buckets = Buckets::new(boundaries.to_vec()).expect("valid boundaries");
    Histogram::new(Arc::new(buckets), counts)
}

/// Collects formatted log output so tests can check which events fired
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` with a subscriber recording every event on this thread, returning its result and the logs
pub(crate) fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs.contents())
}
