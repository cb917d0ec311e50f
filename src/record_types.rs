use std::cmp::{Ordering, PartialOrd};
use std::fmt;
use std::io::BufRead;
use std::sync::atomic::{self, AtomicUsize};

use log::{error, warn};

/// A (key,value) pair. On disk, a record is one line: `<key> <value>`.
///
/// A record with an empty key doesn't carry data; it marks the end of a stream
/// (see `Record::end()`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub value: i64,
}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Record) -> Option<Ordering> {
        match self.key.cmp(&other.key) {
            Ordering::Equal => Some(self.value.cmp(&other.value)),
            o => Some(o),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.key, self.value)
    }
}

impl Record {
    pub fn new<S: Into<String>>(key: S, value: i64) -> Record {
        Record {
            key: key.into(),
            value: value,
        }
    }

    /// The end-of-stream sentinel.
    pub fn end() -> Record {
        Record::default()
    }

    pub fn is_end(&self) -> bool {
        self.key.is_empty()
    }

    /// Parses one line of a container. The value is the last whitespace-separated token;
    /// everything before the whitespace preceding it is the key. A blank line parses as
    /// the end sentinel.
    pub fn from_line(line: &str) -> Result<Record, String> {
        let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
        if line.trim().is_empty() {
            return Ok(Record::end());
        }
        match line.rsplit_once(char::is_whitespace) {
            None => Err(format!("no value in line {:?}", line)),
            Some((key, value)) => match value.parse::<i64>() {
                Ok(v) => Ok(Record::new(key, v)),
                Err(e) => Err(format!("bad value in line {:?}: {}", line, e)),
            },
        }
    }
}

/// Reads the next record from a container stream. Returns None at the end of the stream,
/// at an empty key, or on an I/O error. Malformed lines are skipped.
pub fn read_record(input: &mut dyn BufRead) -> Option<Record> {
    let mut line = String::new();
    loop {
        line.clear();
        match input.read_line(&mut line) {
            Err(e) => {
                error!("couldn't read record: {}", e);
                return None;
            }
            Ok(0) => return None,
            Ok(_) => (),
        }
        match Record::from_line(&line) {
            Ok(r) => {
                if r.is_end() {
                    return None;
                }
                return Some(r);
            }
            Err(e) => warn!("skipping record: {}", e),
        }
    }
}

/// Counts the records written by the workers of one stage. Shared between all workers of
/// a stage, and read by the shuffle afterwards to size its output partitions.
#[derive(Debug, Default)]
pub struct ItemCounter {
    n: AtomicUsize,
}

impl ItemCounter {
    pub fn new() -> ItemCounter {
        ItemCounter { n: AtomicUsize::new(0) }
    }
    pub fn incr(&self) {
        self.n.fetch_add(1, atomic::Ordering::SeqCst);
    }
    pub fn get(&self) -> usize {
        self.n.load(atomic::Ordering::SeqCst)
    }
    pub fn reset(&self) {
        self.n.store(0, atomic::Ordering::SeqCst);
    }
}
