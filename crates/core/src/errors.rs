use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("no recommendable products remain (catalog size {catalog_size})")]
    NoCandidates { catalog_size: usize },
}
