//! Asset loaders

pub mod obj;

pub use obj::{load_obj, load_obj_buf};
