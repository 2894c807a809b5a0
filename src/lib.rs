//! Live social wall: snapshots of YouTube, Instagram and TikTok posts pushed
//! by a socket.io backend, filtered by platform and rendered to a page.

pub mod config;
pub mod controls;
pub mod error;
pub mod filter;
pub mod markup;
pub mod media;
pub mod post;
pub mod render;
pub mod sources;
pub mod view;
pub mod wall;
