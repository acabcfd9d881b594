/// Holds the version literal reported by this instance.
#[derive(Clone, Copy, Debug)]
pub struct VersionService {
    version: &'static str,
}

impl VersionService {
    pub fn new(version: &'static str) -> Self {
        Self { version }
    }

    pub fn version(&self) -> &'static str {
        self.version
    }
}
