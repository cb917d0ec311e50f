//! Mappers and reducers built from plain functions.

use std::io::BufRead;

use crate::mapreducer::{Mapper, Reducer};
use crate::record_types::{read_record, Record};

/// map() function type: reads from the input and returns one record (or `Record::end()`).
pub type MapperF = fn(&mut dyn BufRead) -> Record;
/// Fold function type: combines the accumulator with the next record into a new accumulator.
pub type FoldF = fn(&Record, Record) -> Record;

/// A Mapper calling the supplied function.
#[derive(Clone)]
pub struct ClosureMapper {
    mapper: MapperF,
}

impl ClosureMapper {
    pub fn new(mapper: MapperF) -> ClosureMapper {
        ClosureMapper { mapper: mapper }
    }
}

impl Mapper for ClosureMapper {
    fn map(&mut self, input: &mut dyn BufRead) -> Record {
        (self.mapper)(input)
    }
}

/// A Reducer that reads one record per call and folds it into the accumulator using the
/// supplied function.
#[derive(Clone)]
pub struct ClosureReducer {
    fold: FoldF,
    result: Record,
}

impl ClosureReducer {
    /// `seed` is the initial accumulator; it is also the result of an empty partition.
    pub fn new(fold: FoldF, seed: Record) -> ClosureReducer {
        ClosureReducer {
            fold: fold,
            result: seed,
        }
    }
}

impl Reducer for ClosureReducer {
    fn reduce(&mut self, input: &mut dyn BufRead) -> Record {
        if let Some(r) = read_record(input) {
            self.result = (self.fold)(&self.result, r);
        }
        self.result.clone()
    }

    fn result(&self) -> &Record {
        &self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sum(acc: &Record, r: Record) -> Record {
        Record::new(r.key, acc.value + r.value)
    }

    fn first_word(input: &mut dyn BufRead) -> Record {
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(n) if n > 0 => Record::new(line.split_whitespace().next().unwrap_or(""), 1),
            _ => Record::end(),
        }
    }

    #[test]
    fn test_closure_reducer() {
        let mut r = ClosureReducer::new(sum, Record::new("", 0));
        let mut input = Cursor::new("a 1\nb 2\nc 3\n");
        r.reduce(&mut input);
        r.reduce(&mut input);
        assert_eq!(r.reduce(&mut input), Record::new("c", 6));
        // exhausted: unchanged
        assert_eq!(r.reduce(&mut input), Record::new("c", 6));
        assert_eq!(r.result(), &Record::new("c", 6));
    }

    #[test]
    fn test_closure_mapper() {
        let mut m = ClosureMapper::new(first_word);
        let mut input = Cursor::new("hello world\nfoo\n");
        assert_eq!(m.map(&mut input), Record::new("hello", 1));
        assert_eq!(m.map(&mut input), Record::new("foo", 1));
        assert!(m.map(&mut input).is_end());
    }
}
