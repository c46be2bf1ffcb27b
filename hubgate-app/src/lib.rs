pub mod agent;
pub mod bootstrap;
pub mod config;
pub mod serve;
