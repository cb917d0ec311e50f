//! The Mapper and Reducer traits, and the Functor type that hands one of them to a stage.

use std::io::BufRead;

use crate::record_types::Record;

pub trait Mapper: Send {
    /// Consumes a bounded piece of input (typically one line) and returns one record.
    /// Returns `Record::end()` when the input holds no further records.
    ///
    /// Note that this method takes a &mut self; a new mapper is constructed for every
    /// partition, so state is kept between calls within a partition only.
    fn map(&mut self, input: &mut dyn BufRead) -> Record;
}

pub trait Reducer: Send {
    /// Reads the next record from `input` and folds it into the accumulated result, which is
    /// returned. If the input is exhausted (end sentinel), the result is returned unchanged.
    fn reduce(&mut self, input: &mut dyn BufRead) -> Record;

    /// The accumulated result; before any call to reduce() this is the seed.
    fn result(&self) -> &Record;
}

type MapperFactory = Box<dyn Fn() -> Box<dyn Mapper> + Sync>;
type ReducerFactory = Box<dyn Fn() -> Box<dyn Reducer> + Sync>;

/// The transformation a stage applies. The role determines how workers treat their input:
/// Map workers emit one record per call; Reduce workers fold their whole partition into one
/// record. Each variant constructs a fresh functor for every partition.
pub enum Functor {
    Map(MapperFactory),
    Reduce(ReducerFactory),
}

impl Functor {
    /// Map role; each partition gets a default-constructed M.
    pub fn map<M: Mapper + Default + 'static>() -> Functor {
        Functor::Map(Box::new(|| -> Box<dyn Mapper> { Box::new(M::default()) }))
    }

    /// Map role; each partition gets a clone of `proto`.
    pub fn map_with<M: Mapper + Clone + Sync + 'static>(proto: M) -> Functor {
        Functor::Map(Box::new(move || -> Box<dyn Mapper> { Box::new(proto.clone()) }))
    }

    /// Reduce role; each partition starts from a default-constructed R (with its default
    /// seed).
    pub fn reduce<R: Reducer + Default + 'static>() -> Functor {
        Functor::Reduce(Box::new(|| -> Box<dyn Reducer> { Box::new(R::default()) }))
    }

    /// Reduce role; each partition starts from a clone of `seed`, i.e. with the accumulator
    /// `seed` was constructed with.
    pub fn reduce_with<R: Reducer + Clone + Sync + 'static>(seed: R) -> Functor {
        Functor::Reduce(Box::new(move || -> Box<dyn Reducer> { Box::new(seed.clone()) }))
    }

    pub fn is_map(&self) -> bool {
        match *self {
            Functor::Map(_) => true,
            Functor::Reduce(_) => false,
        }
    }

    pub fn role(&self) -> &'static str {
        if self.is_map() { "map" } else { "reduce" }
    }
}
