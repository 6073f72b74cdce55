pub mod error;
pub mod graph;
pub mod heap;
pub mod maximum_flow;
pub mod minimum_cost_flow;

pub use error::{FlowError, Result};
pub use graph::{Edge, Graph, GraphKind};
