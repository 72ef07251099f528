//! recipe-adapters: colaboradores premade del motor de recetas.
//!
//! Este crate provee:
//! - Productores de fuente (`SourceProducer`) para archivos locales y bytes
//!   en línea.
//! - Steps de transformación reutilizables (copiar, mayúsculas, concatenar)
//!   para tareas repetitivas que igual deben quedar en el linaje.
//!
//! Nota: el core no conoce estos tipos; sólo ve `Instructions` y
//! `SourceProducer`.

pub mod sources;
pub mod steps;

pub use sources::{InlineBytes, LocalFile};
pub use steps::{Concatenate, CopyIngredient, Uppercase};
