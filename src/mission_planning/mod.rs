// Mission planning module

pub mod endpoint;
pub mod blazes;

pub use endpoint::*;
pub use blazes::*;
