pub mod config;
pub mod down;
pub mod up;
