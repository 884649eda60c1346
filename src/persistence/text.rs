//! Text Model Persistence
//!
//! Loads a store from a text model file and writes it back.

use hashbrown::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use super::codec::{parse_line, write_entry};
use super::config::{DimensionPolicy, LoadConfig};
use super::progress::Progress;
use crate::error::{Error, LoadError, Result};
use crate::storage::EmbeddingStore;

/// Summary of a completed load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Newline count from the sizing pass
    pub lines: usize,
    /// Rows inserted into the store
    pub loaded: usize,
    /// Malformed rows dropped under the lenient policy
    pub skipped: usize,
}

/// Count newline bytes in a file
pub fn count_lines<P: AsRef<Path>>(path: P) -> io::Result<usize> {
    let mut file = File::open(path)?;
    let mut buf = vec![0u8; 32 * 1024];
    let mut count = 0;

    loop {
        match file.read(&mut buf) {
            Ok(0) => return Ok(count),
            Ok(n) => count += buf[..n].iter().filter(|&&b| b == b'\n').count(),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Load a text model.
///
/// `verbose` prints progress to stderr, `strict` aborts on the first
/// malformed row. On a strict abort the error carries the rows read so far.
pub fn load<P: AsRef<Path>>(
    path: P,
    verbose: bool,
    strict: bool,
) -> std::result::Result<(EmbeddingStore, LoadReport), LoadError> {
    let config = LoadConfig::default()
        .with_verbose(verbose)
        .with_strict(strict);
    load_with(path, &config)
}

/// Load a text model with full configuration
pub fn load_with<P: AsRef<Path>>(
    path: P,
    config: &LoadConfig,
) -> std::result::Result<(EmbeddingStore, LoadReport), LoadError> {
    let mut stderr = io::stderr();
    load_reporting(path.as_ref(), config, &mut stderr)
}

pub(crate) fn load_reporting(
    path: &Path,
    config: &LoadConfig,
    sink: &mut dyn Write,
) -> std::result::Result<(EmbeddingStore, LoadReport), LoadError> {
    // Sizing pass so the map never rehashes during the real read
    let lines = count_lines(path).map_err(LoadError::io)?;
    debug!(path = %path.display(), lines, "Counted model lines");

    let file = File::open(path).map_err(LoadError::io)?;
    read_rows(BufReader::new(file), path, lines, config, sink)
}

/// Parse rows from `reader` into a new store sized for `lines` entries
fn read_rows<R: BufRead>(
    reader: R,
    path: &Path,
    lines: usize,
    config: &LoadConfig,
    sink: &mut dyn Write,
) -> std::result::Result<(EmbeddingStore, LoadReport), LoadError> {
    let mut store = EmbeddingStore::with_capacity(lines);
    let mut report = LoadReport {
        lines,
        ..LoadReport::default()
    };
    let mut lengths: HashMap<usize, usize> = HashMap::new();
    let mut progress = config.verbose.then(|| Progress::new(sink, lines));

    for (idx, raw) in reader.split(b'\n').enumerate() {
        let line_no = idx + 1;

        let parsed = match raw {
            Ok(bytes) => String::from_utf8(bytes)
                .map_err(|_| "row is not valid UTF-8".to_string())
                .and_then(|row| parse_line(&row)),
            Err(e) => {
                settle_dimension(&mut store, config.dimension_policy, &lengths);
                if let Some(p) = progress.as_mut() {
                    p.finish(path);
                }
                warn!(path = %path.display(), line = line_no, error = %e, "Aborting load on read error");
                return Err(LoadError {
                    error: Error::Io(e),
                    partial: Some(store),
                });
            }
        };

        match parsed {
            Ok((word, vector)) => {
                *lengths.entry(vector.len()).or_insert(0) += 1;
                store.insert(word, vector);
                report.loaded += 1;
            }
            Err(reason) if config.strict => {
                settle_dimension(&mut store, config.dimension_policy, &lengths);
                if let Some(p) = progress.as_mut() {
                    p.finish(path);
                }
                warn!(path = %path.display(), line = line_no, %reason, "Aborting strict load");
                return Err(LoadError {
                    error: Error::Format {
                        line: line_no,
                        reason,
                    },
                    partial: Some(store),
                });
            }
            Err(reason) => {
                warn!(line = line_no, %reason, "Skipping malformed row");
                report.skipped += 1;
            }
        }

        if let Some(p) = progress.as_mut() {
            p.tick();
        }
    }

    settle_dimension(&mut store, config.dimension_policy, &lengths);
    if let Some(p) = progress.as_mut() {
        p.finish(path);
    }

    info!(
        path = %path.display(),
        words = store.len(),
        loaded = report.loaded,
        skipped = report.skipped,
        dimension = store.dimension(),
        "Loaded model"
    );

    Ok((store, report))
}

/// Apply the dimension policy once all rows are in.
/// `LastRow` needs nothing: every insert already records its length.
fn settle_dimension(
    store: &mut EmbeddingStore,
    policy: DimensionPolicy,
    lengths: &HashMap<usize, usize>,
) {
    if policy == DimensionPolicy::MostCommon {
        if let Some((&len, _)) = lengths
            .iter()
            .max_by_key(|&(&len, &count)| (count, len))
        {
            store.set_dimension(len);
        }
    }
}

/// Write every entry as a text row, sorted by word.
///
/// The file is created or truncated; a failed write leaves it partially
/// written.
pub fn save<P: AsRef<Path>>(store: &EmbeddingStore, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for (word, vector) in store.sorted_entries() {
        write_entry(&mut writer, word, vector)?;
    }
    writer.flush()?;

    info!(path = %path.display(), words = store.len(), "Saved model");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MODEL: &str = "dog 1.0 0.0\ncat 0.9 0.1\nrock -1.0 0.0\n";

    fn write_model(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_count_lines() {
        let dir = tempdir().unwrap();
        let path = write_model(dir.path(), "m.txt", MODEL);
        assert_eq!(count_lines(&path).unwrap(), 3);

        let path = write_model(dir.path(), "n.txt", "a 1\nb 2");
        assert_eq!(count_lines(&path).unwrap(), 1);
    }

    #[test]
    fn test_load() {
        let dir = tempdir().unwrap();
        let path = write_model(dir.path(), "model.txt", MODEL);

        let (store, report) = load(&path, false, true).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.dimension(), 2);
        assert!(store.validate_dimensions());
        assert_eq!(
            report,
            LoadReport {
                lines: 3,
                loaded: 3,
                skipped: 0
            }
        );

        let results = store.lookup("dog", 2).unwrap();
        assert_eq!(results[0].word, "cat");
        assert_eq!(results[1].word, "rock");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load(dir.path().join("absent.txt"), false, true).unwrap_err();
        assert!(matches!(err.error, Error::Io(_)));
        assert!(err.into_partial().is_none());
    }

    #[test]
    fn test_strict_load_returns_partial_store() {
        let dir = tempdir().unwrap();
        let path = write_model(
            dir.path(),
            "bad.txt",
            "dog 1.0 0.0\ncat 0.9 oops\nrock -1.0 0.0\n",
        );

        let err = load(&path, false, true).unwrap_err();
        match &err.error {
            Error::Format { line, reason } => {
                assert_eq!(*line, 2);
                assert!(reason.contains("oops"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let partial = err.into_partial().unwrap();
        assert_eq!(partial.words(), vec!["dog"]);
    }

    #[test]
    fn test_read_error_returns_partial_store() {
        struct Broken;

        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "device went away"))
            }
        }

        let rows = io::Cursor::new(&b"dog 1.0 0.0\ncat 0.9 0.1\n"[..]).chain(Broken);
        let mut out = Vec::new();
        let config = LoadConfig::default().with_verbose(true);

        let err = read_rows(
            BufReader::new(rows),
            Path::new("broken.txt"),
            3,
            &config,
            &mut out,
        )
        .unwrap_err();

        match &err.error {
            Error::Io(e) => assert_eq!(e.to_string(), "device went away"),
            other => panic!("unexpected error: {other}"),
        }
        let partial = err.into_partial().unwrap();
        assert_eq!(partial.words(), vec!["cat", "dog"]);
        assert_eq!(partial.dimension(), 2);

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("done with import of 'broken.txt'"));
    }

    #[test]
    fn test_lenient_load_with_mixed_lengths_is_queryable() {
        let dir = tempdir().unwrap();
        let path = write_model(dir.path(), "mixed.txt", "dog 1 0\ncat 0.9 0.1 0.5\nrock -1 0\n");

        let (store, report) = load(&path, false, false).unwrap();
        assert_eq!(report.loaded, 3);
        assert!(!store.validate_dimensions());

        let results = store.lookup("dog", 2).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].word, "rock");
        assert!(store.compare("dog", "cat").is_none());
    }

    #[test]
    fn test_lenient_load_skips_bad_rows() {
        let dir = tempdir().unwrap();
        let path = write_model(
            dir.path(),
            "bad.txt",
            "dog 1.0 0.0\n\ncat 0.9 oops\nlonely\nrock -1.0 0.0\n",
        );

        let (store, report) = load(&path, false, false).unwrap();
        assert_eq!(store.words(), vec!["dog", "rock"]);
        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped, 3);
    }

    #[test]
    fn test_load_tab_separated() {
        let dir = tempdir().unwrap();
        let path = write_model(dir.path(), "tabs.txt", "dog\t1.0\t0.0\r\ncat  0.9 0.1\n");

        let (store, _) = load(&path, false, true).unwrap();
        assert_eq!(store.get("dog"), Some(&[1.0, 0.0][..]));
        assert_eq!(store.get("cat"), Some(&[0.9, 0.1][..]));
    }

    #[test]
    fn test_dimension_last_row() {
        let dir = tempdir().unwrap();
        let path = write_model(dir.path(), "m.txt", "a 1 2 3\nb 4 5 6\nc 7 8\n");

        let (store, _) = load(&path, false, true).unwrap();
        assert_eq!(store.dimension(), 2);
        assert!(!store.validate_dimensions());
    }

    #[test]
    fn test_dimension_most_common() {
        let dir = tempdir().unwrap();
        let path = write_model(dir.path(), "m.txt", "a 1 2 3\nb 4 5 6\nc 7 8\n");

        let config = LoadConfig::default().with_dimension_policy(DimensionPolicy::MostCommon);
        let (store, _) = load_with(&path, &config).unwrap();
        assert_eq!(store.dimension(), 3);
        assert!(!store.validate_dimensions());

        let path = write_model(dir.path(), "tie.txt", "a 1 2\nb 4 5 6\n");
        let (store, _) = load_with(&path, &config).unwrap();
        assert_eq!(store.dimension(), 3);
    }

    #[test]
    fn test_duplicate_word_overwrites() {
        let dir = tempdir().unwrap();
        let path = write_model(dir.path(), "dup.txt", "a 1 0\na 0 1\n");

        let (store, report) = load(&path, false, true).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(report.loaded, 2);
        assert_eq!(store.get("a"), Some(&[0.0, 1.0][..]));
    }

    #[test]
    fn test_verbose_progress() {
        let dir = tempdir().unwrap();
        let path = write_model(dir.path(), "model.txt", MODEL);

        let mut out = Vec::new();
        let config = LoadConfig::default().with_verbose(true);
        let (store, _) = load_reporting(&path, &config, &mut out).unwrap();
        assert_eq!(store.len(), 3);

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("100.0000% (3 lines)"));
        assert!(out.contains("done with import of"));
    }

    #[test]
    fn test_quiet_load_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = write_model(dir.path(), "model.txt", MODEL);

        let mut out = Vec::new();
        load_reporting(&path, &LoadConfig::default(), &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_save_sorted_rows() {
        let dir = tempdir().unwrap();
        let mut store = EmbeddingStore::new();
        store.insert("zebra", vec![0.5, 0.25]);
        store.insert("ant", vec![1.0, -1.0]);

        let path = dir.path().join("out.txt");
        store.save(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "ant 1.000000 -1.000000\nzebra 0.500000 0.250000\n"
        );
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = EmbeddingStore::new();
        for i in 0..20 {
            let x = i as f64;
            store.insert(format!("word{}", i), vec![x / 3.0, -x / 7.0, 0.1234567 * x]);
        }

        let path = dir.path().join("round.txt");
        save(&store, &path).unwrap();
        let (loaded, report) = load(&path, false, true).unwrap();

        assert_eq!(report.loaded, 20);
        assert_eq!(loaded.words(), store.words());
        assert_eq!(loaded.dimension(), 3);
        for (word, vector) in store.iter() {
            let restored = loaded.get(word).unwrap();
            for (a, b) in vector.iter().zip(restored) {
                assert!((a - b).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_prune_then_save_empty() {
        let dir = tempdir().unwrap();
        let path = write_model(dir.path(), "model.txt", MODEL);

        let (mut store, _) = load(&path, false, true).unwrap();
        let keep: [&str; 0] = [];
        assert!(store.prune(Some(&keep[..])));
        assert!(store.lookup("dog", 2).is_none());

        let out = dir.path().join("empty.txt");
        store.save(&out).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "");

        let (reloaded, _) = load(&out, false, true).unwrap();
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let store = EmbeddingStore::new();
        let err = store.save(dir.path().join("nope").join("out.txt")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
