//! Finds the longest prefix shared by two lines of the input.
//!
//! LineMapper turns every input line into a record `<line> 0`. After sorting and shuffling,
//! PrefixAccumulator compares each key with its predecessor and keeps the key with the longest
//! shared prefix; Maximizer then picks the best of the per-partition results.
//!
//! Keys are only compared within one reduce partition. A pair of keys split across two
//! partitions by the shuffle is never compared, so with several reducers the result can be
//! shorter than the true longest shared prefix.

use std::io::BufRead;

use log::error;

use crate::mapreducer::{Mapper, Reducer};
use crate::record_types::{read_record, Record};

/// Emits one record per non-empty input line, with the line as key. The delimiter should be the
/// one the input is split on (`MRParameters::delimiter`).
#[derive(Clone, Debug)]
pub struct LineMapper {
    delimiter: u8,
}

impl Default for LineMapper {
    fn default() -> LineMapper {
        LineMapper::new(b'\n')
    }
}

impl LineMapper {
    pub fn new(delimiter: u8) -> LineMapper {
        LineMapper { delimiter: delimiter }
    }
}

impl Mapper for LineMapper {
    fn map(&mut self, input: &mut dyn BufRead) -> Record {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match input.read_until(self.delimiter, &mut buf) {
                Err(e) => {
                    error!("couldn't read input line: {}", e);
                    return Record::end();
                }
                Ok(0) => return Record::end(),
                Ok(_) => (),
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(|c: char| c == self.delimiter as char || c == '\r' || c == '\n');
            if !line.trim().is_empty() {
                return Record::new(line, 0);
            }
        }
    }
}

/// Length (in characters) of the common prefix of a and b.
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|&(x, y)| x == y).count()
}

/// Folds a sorted partition into the record whose key shares the longest prefix with the key
/// preceding it; the value is the length of that prefix. Prefixes shorter than the seed's
/// value are not reported.
#[derive(Clone, Debug)]
pub struct PrefixAccumulator {
    prev: Option<String>,
    result: Record,
}

impl Default for PrefixAccumulator {
    fn default() -> PrefixAccumulator {
        PrefixAccumulator::with_min_len(0)
    }
}

impl PrefixAccumulator {
    pub fn with_min_len(min: usize) -> PrefixAccumulator {
        PrefixAccumulator {
            prev: None,
            result: Record::new("", min as i64),
        }
    }
}

impl Reducer for PrefixAccumulator {
    fn reduce(&mut self, input: &mut dyn BufRead) -> Record {
        let r = match read_record(input) {
            None => return self.result.clone(),
            Some(r) => r,
        };
        if let Some(ref prev) = self.prev {
            let n = common_prefix_len(prev, &r.key) as i64;
            if n > self.result.value || (n == self.result.value && self.result.is_end()) {
                self.result = Record::new(r.key.clone(), n);
            }
        }
        self.prev = Some(r.key);
        self.result.clone()
    }

    fn result(&self) -> &Record {
        &self.result
    }
}

/// Keeps the record with the largest value (the first one, if several share it).
#[derive(Clone, Debug, Default)]
pub struct Maximizer {
    result: Record,
}

impl Reducer for Maximizer {
    fn reduce(&mut self, input: &mut dyn BufRead) -> Record {
        if let Some(r) = read_record(input) {
            if self.result.is_end() || r.value > self.result.value {
                self.result = r;
            }
        }
        self.result.clone()
    }

    fn result(&self) -> &Record {
        &self.result
    }
}
