//! Tests for adding and removing variants in container files

#[cfg(test)]
mod tests {
    use charpack::PackError;
    use charpack::diff::DiffOptions;
    use charpack::diff::pack::pack_images;
    use charpack::format::codec::{deserialize, parse_header_and_index, serialize};
    use charpack::format::compression::Zlib;
    use charpack::format::mutator::{add_variants, remove_variants, write_container_file};
    use charpack::format::reader::ContainerFile;
    use charpack::model::{PixelBuffer, Rectangle};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write_scenario(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("sprites.chpk");
        let container =
            pack_images(crate::scenario(), &DiffOptions::strict(8)).expect("Failed to pack");
        let bytes = serialize(&container, &Zlib::default()).expect("Failed to serialize");
        write_container_file(&path, &bytes).expect("Failed to write");
        path
    }

    fn green() -> (String, PixelBuffer) {
        let base = crate::solid(64, 64, [255, 255, 255, 255]);
        let image = crate::painted(&base, Rectangle::new(0, 48, 8, 8), [0, 255, 0, 255]);
        ("green".to_string(), image)
    }

    fn read(path: &Path) -> Vec<u8> {
        std::fs::read(path).expect("Failed to read container")
    }

    // Tests added variants are appended and every variant still rebuilds
    // Verified by re-diffing existing variants against the new image
    #[test]
    fn test_add_variants() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_scenario(&dir);
        let before = parse_header_and_index(&read(&path)).expect("Failed to parse");

        let index = add_variants(&path, &[green()], &DiffOptions::strict(8), &Zlib::default())
            .expect("Failed to add");

        let names: Vec<&str> = index.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["base", "red", "blue", "green"]);

        let bytes = read(&path);
        let after = parse_header_and_index(&bytes).expect("Failed to parse");
        assert_eq!(after.index, index);
        for (old, new) in before.index.iter().zip(&after.index) {
            assert_eq!(old.size, new.size);
        }

        let container = deserialize(&bytes, &Zlib::default()).expect("Failed to deserialize");
        let mut expected = crate::scenario();
        expected.push(green());
        for (name, image) in &expected {
            assert_eq!(&container.reconstruct(name).expect("Failed to rebuild"), image);
        }
    }

    // Tests rejected additions leave the file byte-for-byte unchanged
    // Verified by writing before validating names
    #[test]
    fn test_add_rejections_leave_file_untouched() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_scenario(&dir);
        let original = read(&path);
        let options = DiffOptions::strict(8);
        let zlib = Zlib::default();

        let existing = ("red".to_string(), green().1);
        assert!(matches!(
            add_variants(&path, &[existing], &options, &zlib),
            Err(PackError::DuplicateVariantName { name }) if name == "red"
        ));

        assert!(matches!(
            add_variants(&path, &[green(), green()], &options, &zlib),
            Err(PackError::DuplicateVariantName { .. })
        ));

        let small = ("small".to_string(), crate::solid(32, 32, [0; 4]));
        assert!(matches!(
            add_variants(&path, &[small], &options, &zlib),
            Err(PackError::DimensionMismatch { .. })
        ));

        assert!(matches!(
            add_variants(&path, &[], &options, &zlib),
            Err(PackError::EmptyInput)
        ));

        assert_eq!(read(&path), original);
    }

    // Tests removal drops entries but leaves the blocks in place
    // Verified by truncating the file after rewriting the header
    #[test]
    fn test_remove_variants() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_scenario(&dir);
        let original_len = read(&path).len();

        let index = remove_variants(&path, &["red"]).expect("Failed to remove");
        let names: Vec<&str> = index.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["base", "blue"]);

        let bytes = read(&path);
        assert_eq!(bytes.len(), original_len);

        let file = ContainerFile::open(&path).expect("Failed to open");
        assert_eq!(file.entries(), index.as_slice());
        assert_eq!(
            file.extract_variant("blue", &Zlib::default()).expect("Failed to extract"),
            crate::scenario()[2].1
        );
        assert!(matches!(
            file.read_variant("red", &Zlib::default()),
            Err(PackError::VariantNotFound { .. })
        ));
    }

    // Tests unknown names and removing every variant are rejected without writing
    // Verified by rewriting the header before checking the remaining count
    #[test]
    fn test_remove_rejections_leave_file_untouched() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_scenario(&dir);
        let original = read(&path);

        assert!(matches!(
            remove_variants(&path, &["red", "green"]),
            Err(PackError::VariantNotFound { name }) if name == "green"
        ));
        assert!(matches!(
            remove_variants(&path, &["base", "red", "blue"]),
            Err(PackError::CannotRemoveAllVariants)
        ));

        assert_eq!(read(&path), original);
    }

    // Tests adding after a removal compacts the stale blocks away
    // Verified by copying the whole old file instead of the live blocks
    #[test]
    fn test_add_after_remove_compacts() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_scenario(&dir);
        let original_len = read(&path).len();

        remove_variants(&path, &["red", "blue"]).expect("Failed to remove");
        add_variants(&path, &[green()], &DiffOptions::strict(8), &Zlib::default())
            .expect("Failed to add");

        let bytes = read(&path);
        let header = parse_header_and_index(&bytes).expect("Failed to parse");
        assert!(bytes.len() < original_len);
        assert_eq!(
            header.index.last().map(|entry| entry.end()),
            Some(bytes.len() as u64)
        );
        assert_eq!(header.names().collect::<Vec<_>>(), vec!["base", "green"]);
    }

    // Tests writing replaces an existing file and leaves no temporary behind
    // Verified by writing to a fixed temporary name
    #[test]
    fn test_write_container_file_replaces() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("out.chpk");

        write_container_file(&path, b"first").expect("Failed to write");
        write_container_file(&path, b"second").expect("Failed to write");

        assert_eq!(read(&path), b"second");
        let entries = std::fs::read_dir(dir.path()).expect("Failed to list").count();
        assert_eq!(entries, 1);
    }
}
