pub mod circuit;
pub mod custom;
pub mod gate;
pub mod wire;
