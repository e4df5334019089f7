//! Bundled resources: `{root}/{type}/{folder}/...`, e.g. `assets/audio/poke/hello.mp3`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use rand::seq::IndexedRandom;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResType {
    Audio,
    Image,
    Font,
    Json,
}

impl ResType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResType::Audio => "audio",
            ResType::Image => "image",
            ResType::Font => "font",
            ResType::Json => "json",
        }
    }
}

/// Per-feature sub folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubFolder {
    Poke,
    Sign,
    Char,
    Steam,
}

impl SubFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubFolder::Poke => "poke",
            SubFolder::Sign => "sign",
            SubFolder::Char => "madoka",
            SubFolder::Steam => "steam",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssetManager {
    root: PathBuf,
}

impl AssetManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{root}/{type}/{folder}`, created if missing.
    pub fn dir(&self, res_type: ResType, folder: SubFolder) -> PathBuf {
        let path = self.root.join(res_type.as_str()).join(folder.as_str());
        if let Err(e) = fs::create_dir_all(&path) {
            warn!("Could not create asset dir {}: {}", path.display(), e);
        }
        path
    }

    /// Regular, non-hidden files in the folder, sorted by name.
    pub fn files(&self, res_type: ResType, folder: SubFolder) -> Vec<PathBuf> {
        let dir = self.dir(res_type, folder);
        let mut files: Vec<PathBuf> = match fs::read_dir(&dir) {
            Ok(rd) => rd
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| !n.starts_with('.'))
                        .unwrap_or(false)
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        files.sort();
        files
    }

    pub fn file(&self, res_type: ResType, folder: SubFolder, name: &str) -> Option<PathBuf> {
        let path = self.dir(res_type, folder).join(name);
        path.exists().then_some(path)
    }

    /// Contents of a bundled file, or empty bytes when it is missing.
    pub fn read_or_empty(&self, res_type: ResType, folder: SubFolder, name: &str) -> Vec<u8> {
        self.file(res_type, folder, name)
            .and_then(|p| fs::read(p).ok())
            .unwrap_or_default()
    }

    pub fn random_file(&self, res_type: ResType, folder: SubFolder) -> Option<PathBuf> {
        let files = self.files(res_type, folder);
        files.choose(&mut rand::rng()).cloned()
    }

    /// Stable numbering of a folder's files: `{prefix}01`, `{prefix}02`, ... in name order.
    pub fn indexed_files(&self, res_type: ResType, folder: SubFolder, prefix: &str) -> BTreeMap<String, PathBuf> {
        self.files(res_type, folder)
            .into_iter()
            .enumerate()
            .map(|(i, path)| (format!("{prefix}{:02}", i + 1), path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_files_are_numbered_in_name_order() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = AssetManager::new(tmp.path());
        let dir = assets.dir(ResType::Image, SubFolder::Char);
        fs::write(dir.join("b.png"), b"b").unwrap();
        fs::write(dir.join("a.png"), b"a").unwrap();
        fs::write(dir.join(".hidden"), b"x").unwrap();

        let map = assets.indexed_files(ResType::Image, SubFolder::Char, "skin");
        assert_eq!(map.len(), 2);
        assert_eq!(map["skin01"].file_name().unwrap(), "a.png");
        assert_eq!(map["skin02"].file_name().unwrap(), "b.png");
    }

    #[test]
    fn missing_files_read_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = AssetManager::new(tmp.path());
        assert!(assets.read_or_empty(ResType::Image, SubFolder::Steam, "nope.png").is_empty());
        assert!(assets.random_file(ResType::Audio, SubFolder::Poke).is_none());
    }
}
