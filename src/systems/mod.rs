pub mod camera;
pub mod city;
pub mod fields;
pub mod interaction;
pub mod particles;
pub mod render;
pub mod ui;
