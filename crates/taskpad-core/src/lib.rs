pub mod blocks;
pub mod config;
pub mod editor;
pub mod formatting;
pub mod geometry;
pub mod markup;
pub mod overlay;
pub mod project;
pub mod resolver;
pub mod selection;
pub mod session;
pub mod surface;
pub mod tasks;
