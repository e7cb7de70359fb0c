/// Schema module - typed description of a program's inputs

pub mod schema;

pub use schema::*;
