//! Implements a file-based mapreduce process bounded to one machine.
//!
//! The input is split into ranges that are mapped in parallel; map outputs are sorted,
//! shuffled into a new number of partitions (keeping equal keys together) and reduced in
//! parallel. Every step reads and writes containers, i.e. text files in one working directory.
//!

pub mod closure_mr;
pub mod container;
pub mod controller;
pub mod error;
pub mod formats;
pub mod map;
pub mod mapreducer;
pub mod parameters;
pub mod prefix;
pub mod record_types;
pub mod reduce;
pub mod shard_merge;
pub mod shuffle;
pub mod sort;
pub mod split;

pub use crate::container::{ContainerId, ContainerStore, INPUT_ID};
pub use crate::controller::{run_stage, MRController, StageStats};
pub use crate::error::{MRError, Result};
pub use crate::mapreducer::{Functor, Mapper, Reducer};
pub use crate::parameters::MRParameters;
pub use crate::record_types::{ItemCounter, Record};
pub use crate::shuffle::{shuffle, ShuffleStats};
pub use crate::sort::{MemorySort, SortHook};
pub use crate::split::{split_file, Offset};
