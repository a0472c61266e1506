#![forbid(unsafe_code)]

mod catalog;
mod schema;
mod values;

pub(super) use catalog::describe_table;
pub(super) use schema::{install_schema, is_reserved_table};
pub(super) use values::bind_values;
