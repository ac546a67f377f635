pub mod rate;
pub mod sqi;
