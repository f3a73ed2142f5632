use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("a set must hold at least one line")]
    NoLinesPerSet,
    #[error(
        "{set_bits} set-index bits + {block_bits} block-offset bits leave no room in a 64-bit address"
    )]
    AddressTooNarrow { set_bits: u32, block_bits: u32 },
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("unable to allocate {sets} sets of {lines_per_set} lines")]
    Allocation { sets: usize, lines_per_set: usize },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
