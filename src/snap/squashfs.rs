use anyhow::{Context, Result, anyhow};
use log::debug;
use squishy::{EntryKind, SquashFS};
use std::fs;
use std::path::{Component, Path};

use super::MetadataReader;
use super::meta::{SNAP_YAML_PATH, SnapMeta};

/// Reads `meta/snap.yaml` out of a snap's squashfs image.
#[derive(Default, Clone, Copy)]
pub struct SquashfsReader;

impl MetadataReader for SquashfsReader {
    #[tracing::instrument(skip(self))]
    fn read_meta(&self, archive: &Path, scratch: &Path) -> Result<SnapMeta> {
        debug!("Extracting {} from {:?}", SNAP_YAML_PATH, archive);

        let squashfs = SquashFS::from_path(&archive)
            .with_context(|| format!("Failed to open {:?} as a squashfs image", archive))?;

        let entry = squashfs
            .entries()
            .find(|entry| is_snap_yaml(&entry.path))
            .ok_or_else(|| anyhow!("{} not found in {:?}", SNAP_YAML_PATH, archive))?;

        let EntryKind::File(file) = entry.kind else {
            return Err(anyhow!(
                "{} in {:?} is not a regular file",
                SNAP_YAML_PATH,
                archive
            ));
        };

        let dest = scratch.join("snap.yaml");
        squashfs
            .write_file(file, &dest)
            .with_context(|| format!("Failed to extract {} to {:?}", SNAP_YAML_PATH, dest))?;

        let contents = fs::read_to_string(&dest)
            .with_context(|| format!("Failed to read extracted {:?}", dest))?;

        SnapMeta::parse(&contents).with_context(|| format!("Invalid metadata in {:?}", archive))
    }
}

// squashfs entry paths are rooted ("/meta/snap.yaml").
fn is_snap_yaml(path: &Path) -> bool {
    let relative: Vec<_> = path
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::CurDir))
        .collect();
    relative == Path::new(SNAP_YAML_PATH).components().collect::<Vec<_>>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use backhand::{FilesystemWriter, NodeHeader};
    use std::io::Cursor;
    use tempfile::tempdir;

    const KERNEL_YAML: &str = "name: pc-kernel\nversion: 5.15.0-91.101\narchitectures:\n  - amd64\n";

    fn header(mode: u16) -> NodeHeader {
        NodeHeader::new(mode, 0, 0, 0)
    }

    // Builds a squashfs image at `path` from (path, contents) files; a `None`
    // content pushes a directory instead.
    fn write_image(path: &Path, nodes: &[(&str, Option<&str>)]) {
        let mut image = FilesystemWriter::default();
        for (name, contents) in nodes {
            match contents {
                Some(data) => image
                    .push_file(Cursor::new(data.as_bytes().to_vec()), *name, header(0o644))
                    .unwrap(),
                None => image.push_dir(*name, header(0o755)).unwrap(),
            }
        }
        let mut out = fs::File::create(path).unwrap();
        image.write(&mut out).unwrap();
    }

    #[test]
    fn test_read_meta_from_image() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("pc-kernel_1606.snap");
        write_image(
            &archive,
            &[
                ("lib", None),
                ("lib/meta", None),
                ("lib/meta/snap.yaml", Some("name: decoy\nversion: 0.0\n")),
                ("meta", None),
                ("meta/gadget.yaml", Some("volumes: {}\n")),
                ("meta/snap.yaml", Some(KERNEL_YAML)),
            ],
        );

        let meta = SquashfsReader.read_meta(&archive, dir.path()).unwrap();
        assert_eq!(meta.name, "pc-kernel");
        assert_eq!(meta.version, "5.15.0-91.101");
        assert_eq!(meta.architecture().unwrap(), "amd64");
        assert!(dir.path().join("snap.yaml").exists());
    }

    #[test]
    fn test_read_meta_image_without_snap_yaml() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("pc-kernel_2.snap");
        write_image(
            &archive,
            &[("meta", None), ("meta/gadget.yaml", Some("volumes: {}\n"))],
        );

        let err = SquashfsReader.read_meta(&archive, dir.path()).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_read_meta_snap_yaml_is_directory() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("pc-kernel_3.snap");
        write_image(&archive, &[("meta", None), ("meta/snap.yaml", None)]);

        let err = SquashfsReader.read_meta(&archive, dir.path()).unwrap_err();
        assert!(err.to_string().contains("not a regular file"));
    }

    #[test]
    fn test_read_meta_image_with_invalid_yaml() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("pc-kernel_4.snap");
        write_image(
            &archive,
            &[("meta", None), ("meta/snap.yaml", Some("name: [unclosed\n"))],
        );

        let err = SquashfsReader.read_meta(&archive, dir.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid metadata"));
    }

    #[test]
    fn test_is_snap_yaml() {
        assert!(is_snap_yaml(Path::new("/meta/snap.yaml")));
        assert!(is_snap_yaml(Path::new("meta/snap.yaml")));
        assert!(is_snap_yaml(Path::new("./meta/snap.yaml")));
        assert!(!is_snap_yaml(Path::new("/meta/gadget.yaml")));
        assert!(!is_snap_yaml(Path::new("/lib/meta/snap.yaml")));
        assert!(!is_snap_yaml(Path::new("/meta")));
    }

    #[test]
    fn test_read_meta_rejects_non_squashfs() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("pc-kernel_1.snap");
        fs::write(&archive, b"<html>not a snap</html>").unwrap();

        let result = SquashfsReader.read_meta(&archive, dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_read_meta_missing_archive() {
        let dir = tempdir().unwrap();
        let result = SquashfsReader.read_meta(&dir.path().join("absent.snap"), dir.path());
        assert!(result.is_err());
    }
}
