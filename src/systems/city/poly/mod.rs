// polygon kernel and the building footprint shapes built on it

pub mod shapes;
pub mod utils;
