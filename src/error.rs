use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("bad endpoint: {0}")]
    BadEndpoint(String),
    #[error("unbounded: {0}")]
    Unbounded(String),
    #[error("infeasible: {0}")]
    Infeasible(String),
    #[error("not implemented for graph type: {0}")]
    NotImplementedForGraphType(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("overflow: {0}")]
    Overflow(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
