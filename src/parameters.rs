//! Parameters for a mapreduce process.
//!

use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct MRParameters {
    pub work_dir: PathBuf,
    pub container_prefix: String,

    pub delimiter: u8,

    pub mappers: usize,
    pub reducers: usize,

    pub clean_on_init: bool,
}

impl Default for MRParameters {
    fn default() -> MRParameters {
        MRParameters::new()
    }
}

impl MRParameters {
    pub fn new() -> MRParameters {
        MRParameters {
            work_dir: PathBuf::from("./output/"),
            container_prefix: String::from("c"),
            delimiter: b'\n',
            mappers: 4,
            reducers: 4,
            clean_on_init: true,
        }
    }

    /// Directory holding all containers, including the reserved input container.
    /// It is created if it doesn't exist yet.
    ///
    /// Default ./output/
    pub fn set_work_dir<P: Into<PathBuf>>(mut self, dir: P) -> MRParameters {
        self.work_dir = dir.into();
        self
    }

    /// Prefix of container file names; the container id is appended to it
    /// (`c-1` is the input, `c0`, `c1`, ... are stage outputs).
    ///
    /// Default c
    pub fn set_container_prefix(mut self, prefix: String) -> MRParameters {
        self.container_prefix = prefix;
        self
    }

    /// The byte separating input records. Partition boundaries are always placed directly
    /// after one of these.
    ///
    /// Default '\n'
    pub fn set_delimiter(mut self, delimiter: u8) -> MRParameters {
        self.delimiter = delimiter;
        self
    }

    /// Determines how many partitions the map stage splits the input into, and how many
    /// partitions the map output is shuffled into for the reduce stage. Every partition is
    /// processed by its own thread.
    ///
    /// Default 4/4
    pub fn set_concurrency(mut self, mappers: usize, reducers: usize) -> MRParameters {
        self.mappers = mappers;
        self.reducers = reducers;
        self
    }

    /// Whether to remove leftover containers (but not the input) from the working directory
    /// when a controller is set up.
    ///
    /// Default true
    pub fn set_clean_on_init(mut self, clean: bool) -> MRParameters {
        self.clean_on_init = clean;
        self
    }
}
