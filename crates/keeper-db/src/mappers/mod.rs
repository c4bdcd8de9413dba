//! Model to entity mappers
//!
//! `From<Model> for Entity` conversions for rows read back from PostgreSQL.

mod guild;
mod member;
mod rule;

pub use member::flags_from_rows;
