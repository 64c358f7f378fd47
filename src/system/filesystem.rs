use crate::demo;
use std::io;
use std::path::Path;

/// Abstraction for filesystem access to enable testing without real files
pub trait FilesystemReader {
    fn read_to_string(&self, path: &str) -> io::Result<String>;
    fn exists(&self, path: &str) -> bool;
}

/// Real filesystem reader using std::fs
pub struct RealFilesystemReader;

impl FilesystemReader for RealFilesystemReader {
    fn read_to_string(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }
}

/// Demo filesystem reader that returns predefined kstat contents.
///
/// Files are matched by name so an overridden kstat directory still resolves.
pub struct DemoFilesystemReader;

impl DemoFilesystemReader {
    fn get_demo_content(&self, path: &str) -> Option<&'static str> {
        let path = Path::new(path);
        let parent = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str());
        match (parent, path.file_name().and_then(|n| n.to_str())) {
            (_, Some("arcstats")) => Some(demo::DEMO_ARCSTATS),
            (_, Some("zfetchstats")) => Some(demo::DEMO_ZFETCHSTATS),
            (_, Some("dmu_tx")) => Some(demo::DEMO_DMU_TX),
            (Some("data"), Some("io")) => Some(demo::DEMO_POOL_IO),
            _ => None,
        }
    }
}

impl FilesystemReader for DemoFilesystemReader {
    fn read_to_string(&self, path: &str) -> io::Result<String> {
        self.get_demo_content(path)
            .map(str::to_string)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Demo: File not mocked: {}", path),
                )
            })
    }

    fn exists(&self, path: &str) -> bool {
        self.get_demo_content(path).is_some()
    }
}
