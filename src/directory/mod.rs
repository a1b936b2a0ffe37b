pub mod hot_reload;
pub mod loader;

pub use hot_reload::{DirectoryResolver, DirectoryWatcher};
pub use loader::{load_directory, Directory, DirectoryError, DirectoryLoader};
