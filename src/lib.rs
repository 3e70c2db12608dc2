// lib.rs — skybox creator: cube geometry, spherical mapping, preview and export

pub mod config;
pub mod geometry;
pub mod i18n;
pub mod mesh;
pub mod project;
pub mod projection;
pub mod renderer;
pub mod texture;
pub mod viewer;
