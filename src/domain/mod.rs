pub mod entity;
pub mod frame;
pub mod path;
pub mod physics;
pub mod rules;
pub mod tile;
