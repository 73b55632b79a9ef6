pub mod alphabet;
pub mod api;
pub mod config;
pub mod error;
pub mod optimizer;
pub mod permutation;
pub mod scorer;
// cmd and reports belong to the binary (see main.rs).
