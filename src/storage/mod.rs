mod loro_store;

pub use loro_store::{LoroStore, SLICEPIE_DIR};
