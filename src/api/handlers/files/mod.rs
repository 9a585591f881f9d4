pub mod download;
pub mod info;
pub mod process;
pub mod types;
pub mod upload;

pub use types::*;

pub use download::download_file;
pub use info::{get_file_info, list_files};
pub use process::process_file;
pub use upload::upload_file;
