pub mod core;
pub mod gestures;
pub mod player;
pub mod render2d;
pub mod screens;
pub mod ui;
