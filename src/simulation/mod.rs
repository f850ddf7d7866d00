pub mod snapshot_gen;
