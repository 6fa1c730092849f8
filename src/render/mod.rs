pub mod figure;
pub mod svg;

use std::path::PathBuf;
use thiserror::Error;

pub use figure::Figure;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to draw figure: {0}")]
    Draw(String),
}
