// trackmeas_sim/src/simulation/mod.rs

pub mod config;
pub mod core;
pub mod digitizer;
pub mod generator;
pub mod pipeline;
