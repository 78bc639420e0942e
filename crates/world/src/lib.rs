mod chunk;
mod codec;
mod generator;
mod inventory;
mod leaf_decay;
mod noise;
mod persist;
mod rng;
mod save;
mod storage;
mod terrain;
mod trees;
mod world;

pub use chunk::*;
pub use codec::*;
pub use generator::*;
pub use inventory::*;
pub use leaf_decay::*;
pub use noise::*;
pub use persist::*;
pub use rng::*;
pub use save::*;
pub use storage::*;
pub use terrain::*;
pub use trees::*;
pub use world::*;
