//! Audit log: an optional, file-backed per-frame record, distinct from
//! operational `tracing` output. Writes happen on a dedicated thread so a
//! slow or stalled disk never blocks the Reader or Writer Gate.

use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread::JoinHandle;
use wsc_core::SessionId;

const TEXT_INLINE_LIMIT: usize = 500;
const HEX_INLINE_LIMIT: usize = 32;
const HEX_PREVIEW_LEN: usize = 16;

fn render_content(kind_label: &str, bytes: &[u8]) -> String {
    if kind_label == "TEXT" {
        let text = String::from_utf8_lossy(bytes);
        if bytes.len() > TEXT_INLINE_LIMIT {
            format!("{}…(truncated)", &text[..text.floor_char_boundary(TEXT_INLINE_LIMIT)])
        } else {
            text.into_owned()
        }
    } else if bytes.len() <= HEX_INLINE_LIMIT {
        hex_encode(bytes)
    } else {
        format!(
            "BINARY: {} bytes, preview: {}…",
            bytes.len(),
            hex_encode(&bytes[..HEX_PREVIEW_LEN.min(bytes.len())])
        )
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

trait FloorCharBoundary {
    fn floor_char_boundary(&self, index: usize) -> usize;
}

impl FloorCharBoundary for str {
    fn floor_char_boundary(&self, index: usize) -> usize {
        if index >= self.len() {
            return self.len();
        }
        let mut i = index;
        while i > 0 && !self.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// A single audit-log line, appended with a dedicated background thread.
pub struct AuditLog {
    tx: Mutex<Option<Sender<String>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl AuditLog {
    /// Open `path` append-only, mode `0600`, and write the session-start marker.
    /// Callers must validate `path` themselves (see `wsc-cli::logpath`).
    pub fn open(path: &Path, session: &SessionId, url: &str, version: &str) -> std::io::Result<Self> {
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file: File = options.open(path)?;

        writeln!(
            file,
            "=== session start === version={version} session={session} url={url} time={}",
            timestamp()
        )?;

        let (tx, rx) = mpsc::channel::<String>();
        let handle = std::thread::Builder::new()
            .name("wsc-audit-writer".into())
            .spawn(move || {
                let mut file = file;
                for line in rx {
                    let _ = writeln!(file, "{line}");
                }
                let _ = file.flush();
            })
            .expect("failed to spawn audit writer thread");

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
        })
    }

    fn enqueue(&self, line: String) {
        if let Some(tx) = self.tx.lock().unwrap().as_ref() {
            let _ = tx.send(line);
        }
    }

    /// Record an outbound frame.
    pub fn record_send(&self, kind_label: &str, bytes: &[u8]) {
        self.enqueue(format!(
            "[{}] SEND {} ({} bytes): {}",
            timestamp(),
            kind_label,
            bytes.len(),
            render_content(kind_label, bytes)
        ));
    }

    /// Record an inbound frame.
    pub fn record_recv(&self, kind_label: &str, bytes: &[u8]) {
        self.enqueue(format!(
            "[{}] RECV {} ({} bytes): {}",
            timestamp(),
            kind_label,
            bytes.len(),
            render_content(kind_label, bytes)
        ));
    }

    /// Write the session-end marker, flush, and close. Idempotent.
    pub fn close(&self, session: &SessionId) {
        self.enqueue(format!(
            "=== session end === session={session} time={}",
            timestamp()
        ));
        // Dropping the sender lets the writer thread's `for line in rx` loop end.
        let sender = self.tx.lock().unwrap().take();
        drop(sender);
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AuditLog {
    fn drop(&mut self) {
        let _ = self.tx.lock().unwrap().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_renders_inline() {
        assert_eq!(render_content("TEXT", b"hello"), "hello");
    }

    #[test]
    fn long_text_is_truncated() {
        let long = "a".repeat(600);
        let rendered = render_content("TEXT", long.as_bytes());
        assert!(rendered.ends_with("…(truncated)"));
    }

    #[test]
    fn small_binary_renders_as_full_hex() {
        let rendered = render_content("BINARY", &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(rendered, "deadbeef");
    }

    #[test]
    fn large_binary_renders_as_preview() {
        let data = vec![0xab; 64];
        let rendered = render_content("BINARY", &data);
        assert!(rendered.starts_with("BINARY: 64 bytes, preview: "));
    }

    #[test]
    fn open_write_and_close_round_trips() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("wsc_audit_test_{}.log", uuid::Uuid::new_v4().simple()));
        let session = SessionId::generate();
        let log = AuditLog::open(&path, &session, "wss://example/ws", "0.1.0").unwrap();
        log.record_send("TEXT", b"hi");
        log.close(&session);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("=== session start ==="));
        assert!(contents.contains("=== session end ==="));
        assert!(contents.contains("SEND TEXT"));
        let _ = std::fs::remove_file(&path);
    }
}
