#[cfg(feature = "async")]
mod t {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use readerz::{ReaderzError, is_wrapped, open_async, open_path_async};
    use std::io::Write;
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[tokio::test]
    async fn async_plain_passthrough() {
        let mut rdr = open_async(&b"plain async bytes"[..]).await.unwrap();
        assert!(!rdr.is_gzip());
        let mut out = Vec::new();
        rdr.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"plain async bytes");
    }

    #[tokio::test]
    async fn async_gzip_members() {
        let mut joined = gzip(b"one ");
        joined.extend(gzip(b"two"));
        let mut rdr = open_async(&joined[..]).await.unwrap();
        assert!(rdr.is_gzip());
        let mut out = String::new();
        rdr.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "one two");
    }

    #[tokio::test]
    async fn async_short_input() {
        match open_async(&b"x"[..]).await {
            Err(ReaderzError::ShortRead { needed, available }) => {
                assert_eq!((needed, available), (2, 1));
            }
            Err(e) => panic!("expected short read, got {e}"),
            Ok(_) => panic!("expected short read"),
        }
    }

    #[tokio::test]
    async fn async_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, gzip(b"from disk")).unwrap();

        let mut rdr = open_path_async(&path).await.unwrap();
        let mut out = Vec::new();
        rdr.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"from disk");
        let _file = rdr.into_inner();
    }

    #[tokio::test]
    async fn async_magic_with_garbage_fails_construction() {
        for input in [
            &b"\x1f\x8bgarbage that is not a gzip header"[..],
            &b"\x1f\x8b\x08"[..],
            &[0x1F, 0x8B, 0x08, 0xE0, 0, 0, 0, 0, 0, 0xFF][..],
        ] {
            match open_async(input).await {
                Err(ReaderzError::DecompressionInit(_)) => {}
                Err(e) => panic!("expected init error, got {e}"),
                Ok(_) => panic!("expected init error for {input:?}"),
            }
        }
    }

    #[tokio::test]
    async fn async_corrupt_body_is_wrapped() {
        let mut bytes = gzip(&(0..65_536u32).map(|i| (i * 31 % 251) as u8).collect::<Vec<_>>());
        let crc_at = bytes.len() - 8;
        bytes[crc_at] ^= 0xFF;

        let mut rdr = open_async(&bytes[..]).await.unwrap();
        let mut out = Vec::new();
        let err = rdr.read_to_end(&mut out).await.unwrap_err();
        assert!(is_wrapped(&err));
        assert!(matches!(
            ReaderzError::from_io(err),
            ReaderzError::Decompression(_)
        ));
    }
}
