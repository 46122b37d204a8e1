// src/exec/mod.rs

//! Handler dispatch: the boundary between the engine and the package
//! installation collaborators (mount, link, copy data, aliases, hooks,
//! services, gadget connections).

pub mod handler;

pub use handler::{FnHandler, HandlerRegistry, TaskHandler, TaskView};
