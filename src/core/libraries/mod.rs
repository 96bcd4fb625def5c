mod fetcher;

pub use fetcher::{DependencyDownloader, LibraryReport};
