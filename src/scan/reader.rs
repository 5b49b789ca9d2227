use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::parse::parse_record;

/// Where scan records come from: a serial device node, a capture file, or stdin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    Path(PathBuf),
}

impl InputSource {
    /// `-` selects stdin; anything else is a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::Path(PathBuf::from(arg))
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Stdin => "stdin".to_owned(),
            Self::Path(path) => path.display().to_string(),
        }
    }

    fn open(&self) -> Result<Box<dyn BufRead>> {
        match self {
            Self::Stdin => Ok(Box::new(io::stdin().lock())),
            Self::Path(path) => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open input {}", path.display()))?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Connected(String),
    Scan(String),
    /// End of stream (`None`) or the error that ended it.
    Disconnected(Option<String>),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub scans: usize,
    pub malformed: usize,
}

/// Reads newline-delimited records and hands every identifier to `sink`,
/// stopping early when `sink` returns `false`. Malformed records are logged
/// and skipped.
pub fn read_records(
    mut reader: impl BufRead,
    mut sink: impl FnMut(String) -> bool,
) -> io::Result<ReadStats> {
    let mut stats = ReadStats::default();
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            return Ok(stats);
        }

        let line = String::from_utf8_lossy(&buffer);
        let line = line.strip_suffix('\n').unwrap_or(&line);
        match parse_record(line) {
            Ok(Some(id)) => {
                stats.scans += 1;
                if !sink(id) {
                    return Ok(stats);
                }
            }
            Ok(None) => {}
            Err(error) => {
                stats.malformed += 1;
                warn!(%error, "skipping malformed input record");
            }
        }
    }
}

/// Starts a reader thread for `source`. `wake` runs after every event so a
/// UI can schedule a repaint.
pub fn spawn_reader(
    source: InputSource,
    wake: impl Fn() + Send + 'static,
) -> Receiver<InputEvent> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let send = |event: InputEvent| {
            let delivered = tx.send(event).is_ok();
            wake();
            delivered
        };

        let label = source.label();
        let reader = match source.open() {
            Ok(reader) => reader,
            Err(error) => {
                warn!(source = %label, "{error:#}");
                send(InputEvent::Disconnected(Some(format!("{error:#}"))));
                return;
            }
        };

        info!(source = %label, "input connected");
        if !send(InputEvent::Connected(label.clone())) {
            return;
        }

        let result = read_records(reader, |id| send(InputEvent::Scan(id)));
        let reason = match result {
            Ok(stats) => {
                info!(
                    source = %label,
                    scans = stats.scans,
                    malformed = stats.malformed,
                    "input closed"
                );
                None
            }
            Err(error) => {
                warn!(source = %label, %error, "input failed");
                Some(error.to_string())
            }
        };
        send(InputEvent::Disconnected(reason));
    });

    rx
}
