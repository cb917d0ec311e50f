//! Containers as text files: one record per line, key and value separated by a space.
//! LinesReader yields the records of such a file; LinesWriter appends them.

use std::fs;
use std::io;
use std::io::BufRead;
use std::path::Path;

use crate::record_types::{read_record, Record};

pub struct LinesReader<Src: BufRead> {
    src: Src,
}

/// Returns a LinesReader reading records from the given file.
pub fn new_from_file<P: AsRef<Path>>(path: P) -> io::Result<LinesReader<io::BufReader<fs::File>>> {
    fs::OpenOptions::new()
        .read(true)
        .open(path)
        .map(move |f| LinesReader { src: io::BufReader::new(f) })
}

impl<Src: BufRead> LinesReader<Src> {
    pub fn new(src: Src) -> LinesReader<Src> {
        LinesReader { src: src }
    }

    /// Access to the underlying stream, e.g. for handing it to a functor.
    pub fn stream(&mut self) -> &mut Src {
        &mut self.src
    }
}

/// Iterate over the records of a LinesReader. Stops at the end of the file or at the first
/// record with an empty key.
impl<Src: BufRead> Iterator for LinesReader<Src> {
    type Item = Record;
    fn next(&mut self) -> Option<Self::Item> {
        read_record(&mut self.src)
    }
}

/// Writer that separates the chunks written by '\n' characters.
pub struct LinesWriter<W: io::Write> {
    file: W,
}

impl LinesWriter<io::BufWriter<fs::File>> {
    pub fn new_to_file<P: AsRef<Path>>(path: P) -> io::Result<LinesWriter<io::BufWriter<fs::File>>> {
        let f = fs::OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
        Ok(LinesWriter { file: io::BufWriter::new(f) })
    }
}

impl<W: io::Write> LinesWriter<W> {
    pub fn new_to_write(w: W) -> LinesWriter<W> {
        LinesWriter { file: w }
    }

    pub fn write_record(&mut self, r: &Record) -> io::Result<()> {
        writeln!(self.file, "{}", r)
    }

    pub fn into_inner(self) -> W {
        self.file
    }
}

impl<W: io::Write> io::Write for LinesWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        self.file.write_all(b"\n")?;
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
