//! Locating region files on disk.
//!
//! Everything here sits on top of the core parser: filename conventions,
//! folder listing and grouping. Region files are named `r.<x>.<z>.mca`
//! (anvil) or `r.<x>.<z>.mcr` (legacy), with the region grid position
//! encoded in the name.

use crate::error::RegionLoadError;
use crate::position::RegionPosition;
use crate::region::{Region, REGION_HEADER_BYTES_LENGTH};
use std::collections::HashMap;
use std::fs::{read_dir, File, OpenOptions};
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{fs, io};

pub trait RegionProvider<S> {
    fn get_region(&self, position: RegionPosition) -> Result<Region<S>, RegionLoadError>;
}

/// Provides regions stored as separate files in one folder, the on-disk
/// layout of a dimension's `region` directory.
pub struct FolderRegionProvider<'a> {
    /// Folder where region files located.
    folder_path: &'a Path,
}

impl<'a> FolderRegionProvider<'a> {
    pub fn new(folder: &'a str) -> FolderRegionProvider<'a> {
        let folder_path = Path::new(folder);

        FolderRegionProvider { folder_path }
    }

    /// Positions of all region files present in the folder.
    pub fn iter_positions(&self) -> Result<impl Iterator<Item = RegionPosition>, io::Error> {
        let positions: Vec<RegionPosition> = read_dir(self.folder_path)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| region_pos_from_filename(&entry.path()))
            .collect();

        Ok(positions.into_iter())
    }
}

impl<'a> RegionProvider<File> for FolderRegionProvider<'a> {
    fn get_region(&self, position: RegionPosition) -> Result<Region<File>, RegionLoadError> {
        if !self.folder_path.exists() {
            fs::create_dir_all(self.folder_path)?;
        }

        let region_name = region_position_filename(position);
        let region_path = self.folder_path.join(region_name);

        let file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .open(region_path)?;

        // A brand new file gets zeroed header tables, which mark every slot
        // empty, so the loader accepts it.
        if file.metadata()?.len() == 0 {
            file.set_len(REGION_HEADER_BYTES_LENGTH)?;
        }

        Region::load(position, file)
    }
}

/// Parses a region position from a `r.<x>.<z>.mca` or `r.<x>.<z>.mcr`
/// filename. Non-conforming names are `None`, not an error.
pub fn region_pos_from_filename(path: &Path) -> Option<RegionPosition> {
    let filename = path.file_name()?.to_str()?;
    let parts: Vec<&str> = filename.split('.').collect();

    if parts.len() != 4 || parts[0] != "r" {
        return None;
    }

    if parts[3] != "mca" && parts[3] != "mcr" {
        return None;
    }

    let x = i32::from_str(parts[1]).ok()?;
    let z = i32::from_str(parts[2]).ok()?;

    Some(RegionPosition::new(x, z))
}

fn region_position_filename(position: RegionPosition) -> String {
    format!("r.{}.{}.mca", position.x, position.z)
}

/// One region file found on disk with its parsed grid position.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RegionFileInfo {
    pub path: PathBuf,
    pub position: RegionPosition,
}

/// Lists region files in a folder, skipping entries whose names don't match
/// the region filename pattern.
pub fn enumerate_region_files<P: AsRef<Path>>(folder: P) -> Result<Vec<RegionFileInfo>, io::Error> {
    let mut files = Vec::new();

    for entry in read_dir(folder)? {
        let path = entry?.path();

        if !path.is_file() {
            continue;
        }

        if let Some(position) = region_pos_from_filename(&path) {
            files.push(RegionFileInfo { path, position });
        }
    }

    Ok(files)
}

/// Lists region files grouped by a caller chosen key, e.g. the region
/// x-coordinate for column processing.
pub fn enumerate_region_files_grouped<P, K, F>(
    folder: P,
    key: F,
) -> Result<HashMap<K, Vec<RegionFileInfo>>, io::Error>
where
    P: AsRef<Path>,
    K: Eq + Hash,
    F: Fn(&RegionFileInfo) -> K,
{
    let mut groups: HashMap<K, Vec<RegionFileInfo>> = HashMap::new();

    for info in enumerate_region_files(folder)? {
        groups.entry(key(&info)).or_insert_with(Vec::new).push(info);
    }

    Ok(groups)
}
