//! Render pipeline: template engine, template store, external compiler and the
//! file-producing glue that ties them together.

pub mod assets;
pub mod compiler;
pub mod handlers;
pub mod output;
pub mod template;
