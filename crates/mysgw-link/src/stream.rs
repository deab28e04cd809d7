//! Reader thread and serialized writer shared by the serial and TCP links.
//!
//! Each link owns exactly one reader thread. The thread reads with a timeout
//! equal to [`QUIESCENCE`]: bytes are accumulated while they keep arriving,
//! and once a read times out everything gathered so far is split on newlines
//! and each non-empty line is decoded and delivered, the last one whether or
//! not it was terminated. A transmission that arrives in several fragments is thus
//! handled as one unit.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use mysgw_metrics::{metric_defs, LinkLabels};
use mysgw_protocol::{DecodeError, LineCodec, Message};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::config::QUIESCENCE;
use crate::error::TransportError;
use crate::link::{Link, MessageHandler};

/// Read chunk size.
const READ_CHUNK: usize = 64;

/// Releases the OS side of a stream so a blocked reader wakes up.
pub(crate) type ShutdownFn = Box<dyn FnOnce() -> io::Result<()> + Send>;

/// State shared between the link handle and its reader thread.
struct Shared {
    /// Registered handler. Held for the whole of a delivery pass, so taking
    /// it out waits for an in-flight delivery to finish.
    handler: Mutex<Option<Arc<dyn MessageHandler>>>,
    stop: AtomicBool,
    failing: AtomicBool,
    labels: LinkLabels,
}

impl Shared {
    fn mark_failing(&self) {
        self.failing.store(true, Ordering::Release);
    }

    /// Decode and deliver every buffered line in `codec`, including an
    /// unterminated tail. Only called once the stream is quiet.
    fn deliver(&self, codec: &mut LineCodec) {
        let guard = self.handler.lock();
        let Some(handler) = guard.as_ref() else {
            codec.clear();
            return;
        };

        while !self.stop.load(Ordering::Acquire) {
            let Some(line) = codec.decode_line().or_else(|| codec.flush_tail()) else {
                break;
            };
            trace!(endpoint = %self.labels.endpoint, line = %line, "rx");
            match Message::decode(&line) {
                Ok(message) => {
                    metrics::counter!(metric_defs::FRAMES_RECEIVED.name, &self.labels.to_labels())
                        .increment(1);
                    handler.handle_message(message);
                }
                Err(err) => {
                    let reason = match err {
                        DecodeError::Parse(_) => "parse",
                        DecodeError::Protocol(_) => "protocol",
                    };
                    warn!(endpoint = %self.labels.endpoint, line = %line, error = %err, "dropping frame");
                    metrics::counter!(
                        metric_defs::FRAMES_DROPPED.name,
                        &self.labels.with(&[("reason", reason.to_string())])
                    )
                    .increment(1);
                }
            }
        }
    }
}

/// A link over any byte stream pair.
pub struct StreamLink<W: Write + Send> {
    shared: Arc<Shared>,
    writer: Mutex<Option<W>>,
    shutdown: Mutex<Option<ShutdownFn>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    reader_id: ThreadId,
    closed: AtomicBool,
}

impl<W: Write + Send> StreamLink<W> {
    /// Start the reader thread and return the link.
    pub(crate) fn start<R>(
        labels: LinkLabels,
        reader: R,
        writer: W,
        shutdown: Option<ShutdownFn>,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<Self, TransportError>
    where
        R: Read + Send + 'static,
    {
        let shared = Arc::new(Shared {
            handler: Mutex::new(Some(handler)),
            stop: AtomicBool::new(false),
            failing: AtomicBool::new(false),
            labels,
        });

        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(format!("mysgw-rx {}", shared.labels.endpoint))
            .spawn(move || read_loop(reader, thread_shared))?;

        Ok(StreamLink {
            shared,
            writer: Mutex::new(Some(writer)),
            shutdown: Mutex::new(shutdown),
            reader_id: handle.thread().id(),
            reader: Mutex::new(Some(handle)),
            closed: AtomicBool::new(false),
        })
    }
}

impl<W: Write + Send> Link for StreamLink<W> {
    fn write(&self, message: &Message) -> bool {
        if self.shared.stop.load(Ordering::Acquire) {
            return false;
        }
        let labels = &self.shared.labels;
        if !message.is_encodable() {
            warn!(endpoint = %labels.endpoint, %message, "refusing frame with a line break in its payload");
            return false;
        }
        let line = message.encode();

        let mut writer = self.writer.lock();
        let Some(stream) = writer.as_mut() else {
            return false;
        };
        match stream.write_all(line.as_bytes()).and_then(|()| stream.flush()) {
            Ok(()) => {
                trace!(endpoint = %labels.endpoint, line = %line.trim_end(), "tx");
                metrics::counter!(metric_defs::FRAMES_SENT.name, &labels.to_labels()).increment(1);
                true
            }
            Err(err) => {
                warn!(endpoint = %labels.endpoint, error = %err, "write failed");
                metrics::counter!(metric_defs::WRITE_FAILURES.name, &labels.to_labels()).increment(1);
                self.shared.mark_failing();
                false
            }
        }
    }

    fn is_failing(&self) -> bool {
        self.shared.failing.load(Ordering::Acquire)
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let endpoint = &self.shared.labels.endpoint;
        debug!(endpoint = %endpoint, "closing link");

        // Unregister first. From any thread but the reader this waits for an
        // in-flight delivery; on the reader the delivery loop sees `stop`.
        let on_reader = thread::current().id() == self.reader_id;
        self.shared.stop.store(true, Ordering::Release);
        if on_reader {
            if let Some(mut handler) = self.shared.handler.try_lock() {
                handler.take();
            }
        } else {
            self.shared.handler.lock().take();
        }

        if let Some(shutdown) = self.shutdown.lock().take() {
            if let Err(err) = shutdown() {
                debug!(endpoint = %endpoint, error = %err, "stream shutdown failed");
            }
        }
        if let Some(mut writer) = self.writer.lock().take() {
            if let Err(err) = writer.flush() {
                debug!(endpoint = %endpoint, error = %err, "flush on close failed");
            }
        }

        // The reader owns the read half and drops it on exit.
        if let Some(handle) = self.reader.lock().take() {
            if on_reader {
                return;
            }
            if handle.join().is_err() {
                warn!(endpoint = %endpoint, "reader thread panicked");
            }
        }
    }

    fn describe(&self) -> String {
        format!("{} {}", self.shared.labels.transport, self.shared.labels.endpoint)
    }
}

impl<W: Write + Send> Drop for StreamLink<W> {
    fn drop(&mut self) {
        self.close();
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

fn read_loop<R: Read>(mut reader: R, shared: Arc<Shared>) {
    let mut codec = LineCodec::new();
    let mut chunk = [0u8; READ_CHUNK];
    let mut pending = false;

    debug!(endpoint = %shared.labels.endpoint, quiescence_ms = QUIESCENCE.as_millis() as u64, "reader started");
    while !shared.stop.load(Ordering::Acquire) {
        match reader.read(&mut chunk) {
            Ok(0) => {
                if !shared.stop.load(Ordering::Acquire) {
                    warn!(endpoint = %shared.labels.endpoint, "stream closed by peer");
                    shared.mark_failing();
                }
                break;
            }
            Ok(n) => {
                let discarded = codec.push(&chunk[..n]);
                if discarded > 0 {
                    warn!(endpoint = %shared.labels.endpoint, bytes = discarded, "discarding unterminated input");
                    metrics::counter!(metric_defs::BYTES_DISCARDED.name, &shared.labels.to_labels())
                        .increment(discarded as u64);
                }
                pending = true;
            }
            Err(err) if is_timeout(&err) => {
                if pending {
                    shared.deliver(&mut codec);
                    pending = false;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                if !shared.stop.load(Ordering::Acquire) {
                    warn!(endpoint = %shared.labels.endpoint, error = %err, "read failed");
                    shared.mark_failing();
                }
                break;
            }
        }
    }

    // Lines received before the stream ended still count.
    if pending && !shared.stop.load(Ordering::Acquire) {
        shared.deliver(&mut codec);
    }
    debug!(endpoint = %shared.labels.endpoint, "reader stopped");
}
