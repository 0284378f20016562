// In-memory corpus collections and their lookup indexes

pub mod in_memory;
pub mod index;

pub use in_memory::OssemCorpus;
pub use index::{CorpusIndex, DuplicateKey};
