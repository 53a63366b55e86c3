pub mod json_loader;

pub use json_loader::{load_all_paper_files, load_paper_records};
