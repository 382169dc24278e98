#[cfg(test)]
mod tests {
    use ark_nio::chained::ReadObserver;
    use ark_nio::{
        channel, initialize, read_file, ChainedFileReader, ReaderConfig,
    };
    use quickcheck_macros::quickcheck;
    use rstest::rstest;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, OnceLock};
    use tempdir::TempDir;
    use tokio::runtime::Runtime;

    fn shared_runtime() -> &'static Runtime {
        static RUNTIME: OnceLock<Runtime> = OnceLock::new();
        RUNTIME.get_or_init(|| {
            ReaderConfig::default()
                .build_runtime()
                .expect("Failed to build runtime")
        })
    }

    fn write_file(dir: &TempDir, content: &[u8]) -> PathBuf {
        let path = dir.path().join("textFile.txt");
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    #[derive(Default)]
    struct Recorder {
        completions: Mutex<Vec<(u64, usize)>>,
    }

    impl ReadObserver for Recorder {
        fn read_completed(&self, offset: u64, result: &io::Result<usize>) {
            if let Ok(n) = result {
                self.completions.lock().unwrap().push((offset, *n));
            }
        }
    }

    #[test]
    fn test_text_read_two_bytes_at_a_time() {
        initialize();
        let dir = TempDir::new("chained_test_text").unwrap();
        let path = write_file(&dir, b"testText");

        let recorder = Arc::new(Recorder::default());
        let reader = ChainedFileReader::open(
            &path,
            &ReaderConfig::with_capacity(2),
            shared_runtime().handle().clone(),
        )
        .unwrap()
        .with_observer(recorder.clone());
        reader.start_read().unwrap();

        let content = reader.await_completion().unwrap();
        assert_eq!(content.as_str().unwrap(), "testText");
        assert_eq!(content.fragments().len(), 4);
        assert_eq!(
            *recorder.completions.lock().unwrap(),
            vec![(0, 2), (2, 2), (4, 2), (6, 2), (8, 0)]
        );
    }

    #[test]
    fn empty_file_completes_with_one_read() {
        initialize();
        let dir = TempDir::new("chained_empty").unwrap();
        let path = write_file(&dir, b"");

        let recorder = Arc::new(Recorder::default());
        let reader = ChainedFileReader::open(
            &path,
            &ReaderConfig::default(),
            shared_runtime().handle().clone(),
        )
        .unwrap()
        .with_observer(recorder.clone());
        reader.start_read().unwrap();

        let content = reader.await_completion().unwrap();
        assert!(content.is_empty());
        assert!(content.fragments().is_empty());
        assert!(reader.is_complete());
        assert_eq!(*recorder.completions.lock().unwrap(), vec![(0, 0)]);
    }

    #[test]
    fn await_is_idempotent_and_survives_close() {
        let dir = TempDir::new("chained_idempotent").unwrap();
        let path = write_file(&dir, "Hello, мир!".as_bytes());

        let reader = ChainedFileReader::open(
            &path,
            &ReaderConfig::with_capacity(3),
            shared_runtime().handle().clone(),
        )
        .unwrap();
        reader.start_read().unwrap();

        let first = reader.await_completion().unwrap();
        let second = reader.await_completion().unwrap();
        assert_eq!(first, second);

        reader.close().unwrap();
        reader.close().unwrap();

        let third = reader.await_completion().unwrap();
        assert_eq!(third, first);
        assert_eq!(first.as_str().unwrap(), "Hello, мир!");
    }

    #[test]
    fn missing_file_fails_on_open() {
        let dir = TempDir::new("chained_missing").unwrap();
        let path = dir.path().join("absent.txt");

        let result = ChainedFileReader::open(
            &path,
            &ReaderConfig::default(),
            shared_runtime().handle().clone(),
        );
        assert!(matches!(result, Err(ark_nio::NioError::Open { .. })));
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(7)]
    #[case(1024)]
    fn read_file_matches_channel_drain(#[case] capacity: usize) {
        let dir = TempDir::new("chained_vs_channel").unwrap();
        let text = "<share>\n  <item id=\"1\">ёжик</item>\n</share>\n";
        let path = write_file(&dir, text.as_bytes());

        let config = ReaderConfig {
            capacity,
            timeout_ms: Some(10_000),
            ..Default::default()
        };
        let chained =
            read_file(&path, &config, shared_runtime().handle().clone())
                .unwrap();
        let drained =
            channel::read_to_string(&path, config.channel_capacity).unwrap();

        assert_eq!(chained.as_str().unwrap(), text);
        assert_eq!(drained, text);
    }

    #[quickcheck]
    fn prop_chained_read_returns_file_bytes(
        data: Vec<u8>,
        capacity: u8,
    ) -> bool {
        let dir = TempDir::new("chained_prop").unwrap();
        let path = write_file(&dir, &data);
        let config = ReaderConfig::with_capacity(capacity as usize % 32 + 1);

        let content =
            read_file(&path, &config, shared_runtime().handle().clone())
                .unwrap();
        let offsets_ascend = content.fragments().windows(2).all(|pair| {
            pair[0].offset + pair[0].len() as u64 == pair[1].offset
        });
        content.as_bytes() == data.as_slice() && offsets_ascend
    }
}
