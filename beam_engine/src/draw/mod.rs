/// Draw module - uniform dispatch, program cache and the draw binder

pub mod uniform_dispatch;
pub mod program_cache;
pub mod draw_binder;

pub use uniform_dispatch::{UniformUpload, Degenerate, resolve_upload};
pub use program_cache::ProgramStateCache;
pub use draw_binder::draw;
