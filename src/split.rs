//! Splits the input container into byte ranges for the map stage. Boundaries are placed
//! directly after a delimiter byte, so no record ends up in two partitions.

use std::fs;
use std::io::{self, BufRead, Seek, SeekFrom};

use log::{debug, error};

use crate::container::ContainerStore;

/// A position in the input container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Offset {
    At(u64),
    /// Read to the end of the file.
    End,
}

impl Offset {
    /// Byte position, or None for `End`.
    pub fn pos(&self) -> Option<u64> {
        match *self {
            Offset::At(p) => Some(p),
            Offset::End => None,
        }
    }
}

fn ceil_div(a: u64, b: u64) -> u64 {
    (a + b - 1) / b
}

/// Computes `partitions + 1` boundaries of the input container; partition i covers
/// `[b[i], b[i+1])`. The first boundary is always 0, the last one is `Offset::End`.
///
/// If the input can't be opened or sized, the error is logged and the returned list holds
/// only the initial 0; callers must check the length before running a stage.
pub fn split_file(store: &ContainerStore, delimiter: u8, partitions: usize) -> Vec<Offset> {
    let mut boundaries = vec![Offset::At(0)];
    if partitions == 0 {
        return boundaries;
    }
    let path = store.input_path();

    match find_boundaries(&path, delimiter, partitions as u64, &mut boundaries) {
        Ok(()) => {
            debug!("split {:?} into {} partitions: {:?}", path, partitions, boundaries);
        }
        Err(e) => {
            error!("couldn't split {:?}: {}", path, e);
            boundaries.truncate(1);
        }
    }
    boundaries
}

fn find_boundaries(path: &std::path::Path,
                   delimiter: u8,
                   partitions: u64,
                   boundaries: &mut Vec<Offset>)
                   -> io::Result<()> {
    let f = fs::File::open(path)?;
    let size = f.metadata()?.len();
    let chunk = ceil_div(size, partitions);
    let mut reader = io::BufReader::new(f);
    let mut skipped = Vec::new();

    for k in 1..partitions {
        let ideal = (chunk * k).saturating_sub(1);
        if ideal >= size {
            break;
        }
        reader.seek(SeekFrom::Start(ideal))?;
        skipped.clear();
        let n = reader.read_until(delimiter, &mut skipped)? as u64;

        if skipped.last() != Some(&delimiter) {
            // Reached EOF without finding a delimiter.
            break;
        }
        boundaries.push(Offset::At(ideal + n));
    }

    while boundaries.len() < partitions as usize + 1 {
        boundaries.push(Offset::End);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::INPUT_ID;
    use tempfile::TempDir;

    fn setup(content: &str) -> (TempDir, ContainerStore) {
        let dir = TempDir::new().unwrap();
        let store = ContainerStore::new(dir.path(), "c");
        fs::write(store.input_path(), content).unwrap();
        (dir, store)
    }

    fn reassemble(content: &str, b: &[Offset]) -> String {
        let bytes = content.as_bytes();
        let mut out = String::new();
        for w in b.windows(2) {
            let start = w[0].pos().unwrap_or(bytes.len() as u64) as usize;
            let end = w[1].pos().unwrap_or(bytes.len() as u64) as usize;
            out.push_str(std::str::from_utf8(&bytes[start..end]).unwrap());
        }
        out
    }

    fn check_properties(content: &str, partitions: usize) {
        let (_d, store) = setup(content);
        let b = split_file(&store, b'\n', partitions);
        assert_eq!(b.len(), partitions + 1);
        assert_eq!(b[0], Offset::At(0));
        assert_eq!(b[partitions], Offset::End);
        for w in b.windows(2) {
            assert!(w[0] <= w[1], "{:?}", b);
        }
        for o in &b[1..] {
            if let Offset::At(p) = *o {
                assert_eq!(content.as_bytes()[p as usize - 1], b'\n');
            }
        }
        assert_eq!(reassemble(content, &b), content);
    }

    #[test]
    fn test_split_sample() {
        let content = "banana\napple\ncherry\napricot\n";
        let (_d, store) = setup(content);
        // 28 bytes: ideal position 13 is the 'c' of "cherry", the boundary moves past its '\n'
        assert_eq!(split_file(&store, b'\n', 2), vec![Offset::At(0), Offset::At(20), Offset::End]);
    }

    #[test]
    fn test_split_properties() {
        let content = "banana\napple\ncherry\napricot\nx\nyy\na long line with several words\nz\n";
        for n in 1..12 {
            check_properties(content, n);
        }
        check_properties("no trailing newline\nlast", 3);
        check_properties("x\nx\nx\nx\nx\nx\nx\n", 4);
    }

    #[test]
    fn test_split_single_partition() {
        let (_d, store) = setup("a\nb\n");
        assert_eq!(split_file(&store, b'\n', 1), vec![Offset::At(0), Offset::End]);
    }

    #[test]
    fn test_split_eof_before_delimiter() {
        // one long record: every boundary after the first is End
        let (_d, store) = setup("abcdefghijklmnop");
        assert_eq!(split_file(&store, b'\n', 3),
                   vec![Offset::At(0), Offset::End, Offset::End, Offset::End]);
    }

    #[test]
    fn test_split_empty_file() {
        let (_d, store) = setup("");
        assert_eq!(split_file(&store, b'\n', 2), vec![Offset::At(0), Offset::End, Offset::End]);
    }

    #[test]
    fn test_split_other_delimiter() {
        let (_d, store) = setup("aa;bb;cc;dd;");
        let b = split_file(&store, b';', 2);
        assert_eq!(b, vec![Offset::At(0), Offset::At(6), Offset::End]);
    }

    #[test]
    fn test_split_missing_input() {
        let dir = TempDir::new().unwrap();
        let store = ContainerStore::new(dir.path(), "c");
        assert!(!store.exists(INPUT_ID));
        assert_eq!(split_file(&store, b'\n', 4), vec![Offset::At(0)]);
    }
}
