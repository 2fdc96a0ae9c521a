pub mod app;
pub mod cli;
pub mod compositor;
pub mod controller;
pub mod device;
pub mod engine;
pub mod gpu;
pub mod magnifier;
pub mod pixel;
pub mod surface;
