pub mod indicators;
pub mod patterns;
pub mod analyzer;


pub use indicators::*;
pub use patterns::*;
pub use analyzer::*;
