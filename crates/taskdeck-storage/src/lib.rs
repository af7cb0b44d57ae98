//! Concrete storage backends for the `KeyValueStore` contract.
//! Each key lives in its own file under a data directory and is replaced atomically.

pub mod file_store;
