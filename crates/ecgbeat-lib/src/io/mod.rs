pub mod source;
pub mod text;

pub use source::{EcgRequest, EcgSource};
