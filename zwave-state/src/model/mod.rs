//! Data model for the device network

mod node;
mod value;

pub use node::{Node, NodeInfo};
pub use value::{RawValue, Value};
