//! In-memory output sinks, one per declared output format.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::context::OutputFormat;

/// Growable byte buffer a job writes one format into.
///
/// Clones share the same buffer, so the executor keeps a handle while the
/// job owns the writer.
#[derive(Debug, Clone)]
pub struct OutputSink {
    format: OutputFormat,
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl OutputSink {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        match self.buffer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Contents decoded as UTF-8; invalid sequences are replaced.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sinks for one job: positional list plus lookup by format.
#[derive(Debug, Clone, Default)]
pub struct OutputSinks {
    ordered: Vec<OutputSink>,
    by_format: HashMap<OutputFormat, OutputSink>,
}

impl OutputSinks {
    /// One fresh, empty sink per format, in declaration order.
    ///
    /// A format declared twice gets two positional sinks; lookup by format
    /// returns the first.
    pub fn allocate(formats: &[OutputFormat]) -> Self {
        let mut sinks = Self::default();
        for &format in formats {
            let sink = OutputSink::new(format);
            sinks.by_format.entry(format).or_insert_with(|| sink.clone());
            sinks.ordered.push(sink);
        }
        sinks
    }

    pub fn ordered(&self) -> &[OutputSink] {
        &self.ordered
    }

    pub fn get(&self, format: OutputFormat) -> Option<&OutputSink> {
        self.by_format.get(&format)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
