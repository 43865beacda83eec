pub mod image_files;
pub mod logging;
