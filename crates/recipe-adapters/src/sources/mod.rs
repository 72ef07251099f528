mod inline;
mod local;

pub use inline::InlineBytes;
pub use local::LocalFile;
