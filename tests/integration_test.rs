use proptest::prelude::*;
use respack::{ResourceBlock, ResourceError, ResourcePackage, HEADER_SIZE};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use tempfile::NamedTempFile;

fn block_with_header(fill: u8, id: u16, payload: &[u8]) -> ResourceBlock {
    let mut block = ResourceBlock::from_parts([fill; HEADER_SIZE], payload.to_vec()).unwrap();
    block.set_id(id);
    block
}

#[test]
fn test_save_and_open_roundtrip() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_path_buf();

    let mut package = ResourcePackage::new([0xA5; HEADER_SIZE]);
    package.blocks.push(block_with_header(0x01, 100, b"\x89PNG\r\n\x1a\n-image-"));
    package.blocks.push(block_with_header(0x02, 101, b""));
    package.blocks.push(block_with_header(0x03, 102, b"xy"));
    package.save(&path).unwrap();

    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(on_disk.len(), package.encoded_len());
    assert_eq!(on_disk.len() % 4, 0);

    let reopened = ResourcePackage::open(&path).unwrap();
    assert_eq!(reopened, package);
    assert_eq!(reopened.to_bytes().unwrap(), on_disk);
}

#[test]
fn test_edit_then_save_keeps_other_blocks() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_path_buf();

    let mut package = ResourcePackage::new([0u8; HEADER_SIZE]);
    for id in 1..=4u16 {
        package.blocks.push(block_with_header(id as u8, id, &vec![id as u8; id as usize * 3]));
    }
    package.save(&path).unwrap();

    let mut edited = ResourcePackage::open(&path).unwrap();
    edited.replace_payload(2, b"GIF89a replaced".to_vec()).unwrap();
    edited.save(&path).unwrap();

    let reopened = ResourcePackage::open(&path).unwrap();
    assert_eq!(reopened.blocks.len(), 4);
    assert_eq!(reopened.blocks[2].payload(), b"GIF89a replaced");
    assert_eq!(reopened.blocks[2].id(), 3);
    assert_eq!(&reopened.blocks[2].header()[0..4], &15u32.to_le_bytes());
    assert_eq!(&reopened.blocks[2].header()[4..0x0E], &[3u8; 10]);
    for i in [0usize, 1, 3] {
        assert_eq!(reopened.blocks[i], package.blocks[i]);
    }
}

#[test]
fn test_streams_from_buffered_file() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_path_buf();

    let mut package = ResourcePackage::new([7u8; HEADER_SIZE]);
    package.blocks.push(ResourceBlock::new(9, vec![0x42; 70_001]).unwrap());
    {
        let file = File::create(&path).unwrap();
        package.write(file).unwrap();
    }

    let mut reader = BufReader::with_capacity(64, File::open(&path).unwrap());
    let reopened = ResourcePackage::read(&mut reader).unwrap();
    assert_eq!(reopened, package);
    // Everything was consumed.
    let mut rest = Vec::new();
    reader.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());
}

#[test]
fn test_truncated_file_reports_counts() {
    let mut package = ResourcePackage::new([0u8; HEADER_SIZE]);
    package.blocks.push(ResourceBlock::new(1, vec![1u8; 10]).unwrap());
    let bytes = package.to_bytes().unwrap();
    assert_eq!(bytes.len(), 32 + 32 + 10 + 2);

    let err = ResourcePackage::from_bytes(&bytes[..32 + 32 + 4]).unwrap_err();
    assert!(matches!(err, ResourceError::TruncatedPayload { expected: 10, actual: 4 }));

    let err = ResourcePackage::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, ResourceError::TruncatedPadding { expected: 2, actual: 1 }));
    assert!(err.to_string().contains("expected 2 bytes, read 1"));
}

fn arb_block() -> impl Strategy<Value = ResourceBlock> {
    (any::<[u8; HEADER_SIZE]>(), prop::collection::vec(any::<u8>(), 0..64))
        .prop_map(|(header, payload)| ResourceBlock::from_parts(header, payload).unwrap())
}

fn arb_package() -> impl Strategy<Value = ResourcePackage> {
    (any::<[u8; HEADER_SIZE]>(), prop::collection::vec(arb_block(), 0..8))
        .prop_map(|(header, blocks)| ResourcePackage { header, blocks })
}

proptest! {
    #[test]
    fn prop_package_roundtrip(package in arb_package()) {
        let bytes = package.to_bytes().unwrap();
        prop_assert_eq!(bytes.len(), package.encoded_len());
        prop_assert_eq!(bytes.len() % 4, 0);

        let parsed = ResourcePackage::read(Cursor::new(&bytes)).unwrap();
        prop_assert_eq!(&parsed, &package);
        prop_assert_eq!(parsed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn prop_set_id_leaves_size_bytes(block in arb_block(), id in any::<u16>()) {
        let mut edited = block.clone();
        edited.set_id(id);
        prop_assert_eq!(&edited.header()[0..4], &block.header()[0..4]);
        prop_assert_eq!(&edited.header()[0x04..0x0E], &block.header()[0x04..0x0E]);
        prop_assert_eq!(&edited.header()[0x10..], &block.header()[0x10..]);
        prop_assert_eq!(edited.id(), id);
    }
}
