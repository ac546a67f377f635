pub mod analyzer;
pub mod detectors;
pub mod error;
pub mod io;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod segment;
pub mod signal;
pub mod synth;
pub mod trace;
pub mod window;

pub use analyzer::*;
pub use error::{EcgError, Result};
pub use pipeline::*;
pub use record::*;
pub use signal::*;
pub use window::*;
