//! Tests for the container layout, header validation and full decoding

#[cfg(test)]
mod tests {
    use charpack::PackError;
    use charpack::diff::DiffOptions;
    use charpack::diff::pack::pack_images;
    use charpack::format::codec::{
        ContainerHeader, EncodedVariant, assemble, block_slice, deserialize,
        encode_variant_block, parse_header_and_index, serialize,
    };
    use charpack::format::compression::{Compressor, Zlib};
    use charpack::io::configuration::{FORMAT_VERSION, MAGIC};
    use charpack::model::{Container, Patch, Rectangle, Variant, VariantIndexEntry};

    fn packed() -> (Container, Vec<u8>) {
        let container =
            pack_images(crate::scenario(), &DiffOptions::strict(8)).expect("Failed to pack");
        let bytes = serialize(&container, &Zlib::default()).expect("Failed to serialize");
        (container, bytes)
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        let field: [u8; 4] = bytes
            .get(offset..offset + 4)
            .and_then(|slice| slice.try_into().ok())
            .expect("Field out of range");
        u32::from_le_bytes(field)
    }

    // Tests the fixed header fields sit at their documented offsets
    // Verified by writing channels as a u32
    #[test]
    fn test_header_layout() {
        let (_, bytes) = packed();

        assert_eq!(bytes.get(..4), Some(&MAGIC[..]));
        assert_eq!(u32_at(&bytes, 4), FORMAT_VERSION);
        assert_eq!(u32_at(&bytes, 8), 64);
        assert_eq!(u32_at(&bytes, 12), 64);
        assert_eq!(bytes.get(16), Some(&4));

        let base_size = u32_at(&bytes, 17) as usize;
        let variant_count = u32_at(&bytes, 21 + base_size);
        assert_eq!(variant_count, 3);
    }

    // Tests serialize then deserialize yields an equal container
    // Verified by reversing patch order on decode
    #[test]
    fn test_deserialize_restores_container() {
        let (container, bytes) = packed();
        let decoded = deserialize(&bytes, &Zlib::default()).expect("Failed to deserialize");

        assert_eq!(decoded, container);
        for (name, image) in crate::scenario() {
            assert_eq!(decoded.reconstruct(&name).expect("Failed to rebuild"), image);
        }
    }

    // Tests index entries are contiguous, start after the header and end at EOF
    // Verified by computing offsets before the index size is known
    #[test]
    fn test_index_is_contiguous() {
        let (_, bytes) = packed();
        let header = parse_header_and_index(&bytes).expect("Failed to parse");

        let mut expected_offset = header.encoded_len() as u64;
        for entry in &header.index {
            assert_eq!(u64::from(entry.offset), expected_offset);
            expected_offset = entry.end();
        }
        assert_eq!(expected_offset, bytes.len() as u64);
        assert_eq!(header.names().collect::<Vec<_>>(), vec!["base", "red", "blue"]);
    }

    // Tests each block decodes to the same variant the container holds
    // Verified by decoding blocks relative to the header end
    #[test]
    fn test_decode_block_matches_variant() {
        let (container, bytes) = packed();
        let zlib = Zlib::default();
        let header = parse_header_and_index(&bytes).expect("Failed to parse");

        for variant in container.variants() {
            let entry = header.find(&variant.name).expect("Missing entry");
            let block = block_slice(&bytes, entry).expect("Block out of range");
            assert_eq!(
                &header.decode_block(&variant.name, block, &zlib).expect("Failed to decode"),
                variant
            );
        }
        assert_eq!(header.decode_base(&zlib).expect("Failed to decode"), *container.base());
        assert!(matches!(
            header.find("green"),
            Err(PackError::VariantNotFound { .. })
        ));
    }

    // Tests wrong magic bytes are rejected
    // Verified by skipping the magic comparison
    #[test]
    fn test_magic_mismatch() {
        let (_, mut bytes) = packed();
        if let Some(magic) = bytes.get_mut(..4) {
            magic.copy_from_slice(b"XXXX");
        }

        assert!(matches!(
            deserialize(&bytes, &Zlib::default()),
            Err(PackError::MagicMismatch { found }) if &found == b"XXXX"
        ));
    }

    // Tests unknown versions are rejected
    // Verified by accepting any version
    #[test]
    fn test_unsupported_version() {
        let (_, mut bytes) = packed();
        if let Some(version) = bytes.get_mut(4..8) {
            version.copy_from_slice(&2u32.to_le_bytes());
        }

        assert!(matches!(
            parse_header_and_index(&bytes),
            Err(PackError::UnsupportedVersion { found: 2 })
        ));
    }

    // Tests every strict prefix of a container fails to decode
    // Verified by tolerating short variant blocks
    #[test]
    fn test_truncation_is_detected() {
        let (_, bytes) = packed();
        let zlib = Zlib::default();

        for len in [0, 3, 10, 20, bytes.len() / 2, bytes.len() - 1] {
            let prefix = bytes.get(..len).expect("Prefix out of range");
            assert!(
                deserialize(prefix, &zlib).is_err(),
                "prefix of {len} bytes decoded"
            );
        }
        assert!(matches!(
            deserialize(bytes.get(..bytes.len() - 1).expect("Prefix out of range"), &zlib),
            Err(PackError::TruncatedData { .. })
        ));
    }

    // Tests bytes left over inside a block are corrupt data
    // Verified by ignoring the exhaustion check
    #[test]
    fn test_trailing_block_bytes() {
        let zlib = Zlib::default();
        let (container, _) = packed();
        let header = ContainerHeader {
            version: FORMAT_VERSION,
            width: 64,
            height: 64,
            channels: 4,
            base_payload: zlib.compress(container.base().data()).expect("Failed to compress"),
            index: Vec::new(),
        };

        let mut block = encode_variant_block(&Variant::new("v", Vec::new()), &zlib)
            .expect("Failed to encode");
        block.push(0);

        assert!(matches!(
            header.decode_block("v", &block, &zlib),
            Err(PackError::CorruptData { .. })
        ));
    }

    // Tests patches outside the image are rejected while decoding
    // Verified by skipping the bounds check in decode_block
    #[test]
    fn test_out_of_bounds_patch() {
        let zlib = Zlib::default();
        let (container, _) = packed();
        let variant = Variant::new(
            "v",
            vec![Patch {
                rect: Rectangle::new(60, 60, 8, 8),
                data: vec![0; 256],
            }],
        );
        let block = encode_variant_block(&variant, &zlib).expect("Failed to encode");
        let header = ContainerHeader {
            version: FORMAT_VERSION,
            width: container.width(),
            height: container.height(),
            channels: container.channels(),
            base_payload: Vec::new(),
            index: Vec::new(),
        };

        assert!(matches!(
            header.decode_block("v", &block, &zlib),
            Err(PackError::CorruptData { .. })
        ));
    }

    // Tests a payload inflating far past its rectangle is rejected as corrupt
    // Verified by decompressing without a bound before the size check
    #[test]
    fn test_oversized_payload_rejected() {
        let zlib = Zlib::default();
        let mut block = Vec::new();
        block.extend_from_slice(&1u32.to_le_bytes());
        for field in [0u32, 0, 2, 2] {
            block.extend_from_slice(&field.to_le_bytes());
        }
        let payload = zlib.compress(&vec![0u8; 1 << 20]).expect("Failed to compress");
        let payload_len = u32::try_from(payload.len()).expect("Payload too large");
        block.extend_from_slice(&payload_len.to_le_bytes());
        block.extend_from_slice(&payload);

        let oversized_base = zlib.compress(&vec![0u8; 1 << 20]).expect("Failed to compress");
        let header = ContainerHeader {
            version: FORMAT_VERSION,
            width: 4,
            height: 4,
            channels: 4,
            base_payload: oversized_base,
            index: Vec::new(),
        };

        assert!(matches!(
            header.decode_block("v", &block, &zlib),
            Err(PackError::CorruptData { .. })
        ));
        assert!(matches!(header.decode_base(&zlib), Err(PackError::CorruptData { .. })));
    }

    // Tests duplicate names and overlapping blocks in the index are rejected
    // Verified by removing validate_index
    #[test]
    fn test_invalid_index() {
        let blocks = vec![
            EncodedVariant {
                name: "a".to_string(),
                block: vec![0; 4],
            },
            EncodedVariant {
                name: "b".to_string(),
                block: vec![0; 4],
            },
        ];
        let header = ContainerHeader {
            version: FORMAT_VERSION,
            width: 1,
            height: 1,
            channels: 4,
            base_payload: Vec::new(),
            index: Vec::new(),
        };
        let (laid_out, bytes) = assemble(header, &blocks).expect("Failed to assemble");
        assert!(parse_header_and_index(&bytes).is_ok());

        let mut duplicate = laid_out.clone();
        if let Some(entry) = duplicate.index.get_mut(1) {
            entry.name = "a".to_string();
        }
        let encoded = [duplicate.encode().expect("Failed to encode"), vec![0; 8]].concat();
        assert!(matches!(
            parse_header_and_index(&encoded),
            Err(PackError::DuplicateVariantName { .. })
        ));

        let mut overlapping = laid_out;
        let first_offset = overlapping.index.first().map_or(0, |entry| entry.offset);
        if let Some(entry) = overlapping.index.get_mut(1) {
            *entry = VariantIndexEntry {
                name: "b".to_string(),
                offset: first_offset + 2,
                size: 4,
            };
        }
        let encoded = [overlapping.encode().expect("Failed to encode"), vec![0; 8]].concat();
        assert!(matches!(
            parse_header_and_index(&encoded),
            Err(PackError::CorruptData { .. })
        ));
    }

    // Tests an index entry pointing past the end is truncated data
    // Verified by clamping block_slice to the input length
    #[test]
    fn test_block_past_end() {
        let entry = VariantIndexEntry {
            name: "v".to_string(),
            offset: 10,
            size: 8,
        };

        assert!(block_slice(&[0; 18], &entry).is_ok());
        assert!(matches!(
            block_slice(&[0; 17], &entry),
            Err(PackError::TruncatedData { .. })
        ));
    }
}
