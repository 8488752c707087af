pub mod error;
pub mod block;
pub mod package;
pub mod inspect;

pub use error::{ResourceError, Result};
pub use block::{ResourceBlock, padding_len, BLOCK_ALIGN, HEADER_SIZE};
pub use package::ResourcePackage;
pub use inspect::{summarize, ResourceKind, ResourceSummary};
