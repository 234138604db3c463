pub mod generator;
pub mod pipeline;
pub mod risk;
pub mod scoring;


pub use generator::*;
pub use pipeline::*;
pub use risk::*;
pub use scoring::*;
