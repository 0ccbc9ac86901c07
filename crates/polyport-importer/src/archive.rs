//! Random access to the downloaded problem package

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

use crate::error::{ImportError, ImportResult};

/// The problem package ZIP.
///
/// Members are addressed by the path strings the descriptor uses; reading a
/// member that does not exist is a hard failure.
pub struct PackageArchive {
    zip: ZipArchive<File>,
    names: HashSet<String>,
}

impl PackageArchive {
    pub fn open(path: &Path) -> ImportResult<Self> {
        let file = File::open(path)?;
        let zip = ZipArchive::new(file)?;
        let names = zip.file_names().map(ToString::to_string).collect();
        Ok(Self { zip, names })
    }

    /// Whether a member exists, for callers that want their own error text
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Read a member fully into memory
    pub fn read(&mut self, name: &str) -> ImportResult<Vec<u8>> {
        if !self.contains(name) {
            return Err(ImportError::import(format!(
                "Archive member {name} is missing"
            )));
        }
        let mut member = self.zip.by_name(name)?;
        let mut buffer = Vec::with_capacity(usize::try_from(member.size()).unwrap_or(0));
        member.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    /// The `problem.xml` descriptor text
    pub fn descriptor_xml(&mut self) -> ImportResult<String> {
        if !self.contains("problem.xml") {
            return Err(ImportError::import("problem.xml not found"));
        }
        let bytes = self.read("problem.xml")?;
        String::from_utf8(bytes)
            .map_err(|_| ImportError::import("problem.xml is not valid UTF-8"))
    }
}
