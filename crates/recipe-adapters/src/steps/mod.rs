//! Steps premade de transformación de texto/archivos.

mod concat;
mod text;

pub use concat::Concatenate;
pub use text::{CopyIngredient, Uppercase};
