// Session index for a FastF1 cache directory.
//
// The cache is scanned for `.ff1pkl` files in either the nested layout
// `YYYY/<Event_Name>/<YYYY-MM-DD>_<Session_Name>/*.ff1pkl` or the flat layout
// `YYYY_YYYY-MM-DD_<Event_Name>_<SID>.ff1pkl` (at any depth), and every session
// not yet present in `session_index.csv` is appended to it. Indexes written
// before the `session_id` column existed are upgraded in place.

use std::{
    collections::HashSet,
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::LazyLock,
};

use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{PaddockError, catalog::SessionRecord};

pub const INDEX_FILE_NAME: &str = "session_index.csv";
const PICKLE_EXTENSION: &str = "ff1pkl";

/// Session designations and the short codes FastF1 uses for them
const SESSION_CODES: [(&str, &str); 8] = [
    ("Practice 1", "FP1"),
    ("Practice 2", "FP2"),
    ("Practice 3", "FP3"),
    ("Sprint Qualifying", "SQ"),
    ("Sprint Shootout", "SS"),
    ("Qualifying", "Q"),
    ("Sprint", "S"),
    ("Race", "R"),
];

static YEAR_DIR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[12][09][0-9]{2}$").unwrap());
static SESSION_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})_(.+)").unwrap());
static FLAT_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<year>\d{4})_(?P<event_date>\d{4}-\d{2}-\d{2})_(?P<event_name>.+)_(?P<sid>FP1|FP2|FP3|SQ|SS|Q|S|R)$",
    )
    .unwrap()
});

pub fn session_code(session_name: &str) -> Option<&'static str> {
    SESSION_CODES
        .iter()
        .find(|(name, _)| *name == session_name)
        .map(|(_, code)| *code)
}

pub fn session_name(code: &str) -> Option<&'static str> {
    SESSION_CODES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
}

/// One line of `session_index.csv`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    #[serde(default)]
    pub session_id: String,
    pub year: String,
    pub event_name: String,
    pub event_date: String,
    pub session_type: String,
    pub sid: String,
}

impl From<IndexRow> for SessionRecord {
    fn from(row: IndexRow) -> Self {
        Self {
            year: row.year,
            event_name: row.event_name,
            session_type: row.session_type,
            session_id: row.session_id,
        }
    }
}

impl IndexRow {
    /// Row for a nested cache entry: `<year>/<event dir>/<date>_<Session_Name>`
    fn from_session_dir(year_dir: &str, event_dir: &str, session_dir: &str) -> Option<Self> {
        let captures = SESSION_DIR.captures(session_dir)?;
        let session_type = captures[2].replace('_', " ");
        let sid = session_code(&session_type)?;
        Some(Self {
            session_id: format!("{year_dir}_{event_dir}_{sid}"),
            year: year_dir.to_string(),
            event_name: event_dir.replace('_', " "),
            event_date: captures[1].to_string(),
            session_type,
            sid: sid.to_string(),
        })
    }

    /// Key of a row from an index without ids: year, event and session code
    fn legacy_session_id(&self) -> String {
        format!(
            "{}_{}_{}",
            self.year,
            self.event_name.replace(' ', "_"),
            self.sid
        )
    }

    fn with_session_id(mut self) -> Self {
        if self.session_id.is_empty() {
            self.session_id = self.legacy_session_id();
        }
        self
    }

    /// Row for a flat cache file, keyed by the file stem
    fn from_file_stem(stem: &str) -> Option<Self> {
        let captures = FLAT_FILE.captures(stem)?;
        let sid = &captures["sid"];
        Some(Self {
            session_id: stem.to_string(),
            year: captures["year"].to_string(),
            event_name: captures["event_name"].replace('_', " "),
            event_date: captures["event_date"].to_string(),
            session_type: session_name(sid).unwrap_or(sid).to_string(),
            sid: sid.to_string(),
        })
    }
}

/// Reads every row of a session index file. Rows without a session id get
/// the `<year>_<Event_Name>_<SID>` key.
pub fn read_index(index_path: &Path) -> Result<Vec<IndexRow>, PaddockError> {
    let path = index_path.display().to_string();
    let mut reader = csv::Reader::from_path(index_path).map_err(|e| {
        PaddockError::IndexReadError {
            path: path.clone(),
            source: e,
        }
    })?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<IndexRow>, csv::Error>>()
        .map_err(|e| PaddockError::IndexReadError { path, source: e })?;
    Ok(rows.into_iter().map(IndexRow::with_session_id).collect())
}

fn has_session_id_column(index_path: &Path) -> Result<bool, PaddockError> {
    let read_error = |e| PaddockError::IndexReadError {
        path: index_path.display().to_string(),
        source: e,
    };
    let mut reader = csv::Reader::from_path(index_path).map_err(read_error)?;
    Ok(reader
        .headers()
        .map_err(read_error)?
        .iter()
        .any(|h| h == "session_id"))
}

/// Builds or extends the session index of a cache directory.
pub struct SessionIndexBuilder {
    cache_dir: PathBuf,
    index_path: PathBuf,
}

impl SessionIndexBuilder {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            index_path: cache_dir.join(INDEX_FILE_NAME),
        }
    }

    pub fn with_index_path(mut self, index_path: PathBuf) -> Self {
        self.index_path = index_path;
        self
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Appends the sessions missing from the index and returns how many were
    /// added. Fails when the cache holds no `.ff1pkl` files at all.
    pub fn build(&self) -> Result<usize, PaddockError> {
        let existing = if self.index_path.is_file() {
            read_index(&self.index_path)?
        } else {
            Vec::new()
        };
        let is_legacy = self.index_path.is_file() && !has_session_id_column(&self.index_path)?;
        let mut known: HashSet<String> = existing.iter().map(|r| r.session_id.clone()).collect();
        debug!("Index {:?} already lists {} sessions", self.index_path, known.len());

        let session_dirs = self.nested_session_dirs()?;
        let flat_files = self.flat_files()?;
        if session_dirs.is_empty() && flat_files.is_empty() {
            return Err(PaddockError::NoCachedSessions {
                path: self.cache_dir.display().to_string(),
            });
        }

        let nested_rows = session_dirs
            .iter()
            .filter_map(|(year, event, session)| IndexRow::from_session_dir(year, event, session));
        let flat_rows = flat_files.iter().filter_map(|stem| IndexRow::from_file_stem(stem));

        let mut new_rows: Vec<IndexRow> = nested_rows
            .chain(flat_rows)
            .filter(|row| known.insert(row.session_id.clone()))
            .collect();
        new_rows.sort_by(|a, b| {
            (&a.year, &a.event_date, &a.sid).cmp(&(&b.year, &b.event_date, &b.sid))
        });

        if is_legacy {
            info!("Upgrading legacy session index {:?}", self.index_path);
            let all_rows: Vec<IndexRow> = existing
                .into_iter()
                .chain(new_rows.iter().cloned())
                .collect();
            self.write_rows(&all_rows, false)?;
        } else if new_rows.is_empty() {
            info!("Session index {:?} is up to date", self.index_path);
            return Ok(0);
        } else {
            self.write_rows(&new_rows, true)?;
        }
        info!(
            "Added {} sessions to index {:?}",
            new_rows.len(),
            self.index_path
        );
        Ok(new_rows.len())
    }

    /// `(year, event, session)` directory names holding at least one pickle
    fn nested_session_dirs(&self) -> Result<Vec<(String, String, String)>, PaddockError> {
        let mut found = Vec::new();
        for year_dir in self.subdirectories(&self.cache_dir)? {
            let Some(year) = dir_name(&year_dir) else {
                continue;
            };
            if !YEAR_DIR.is_match(&year) {
                continue;
            }
            for event_dir in self.subdirectories(&year_dir)? {
                let Some(event) = dir_name(&event_dir) else {
                    continue;
                };
                for session_dir in self.subdirectories(&event_dir)? {
                    if !self.pickles_in(&session_dir)?.is_empty() {
                        if let Some(session) = dir_name(&session_dir) {
                            found.push((year.clone(), event.clone(), session));
                        }
                    }
                }
            }
        }
        Ok(found)
    }

    /// Stems of every pickle under the cache directory. Only stems in the flat
    /// naming scheme turn into rows.
    fn flat_files(&self) -> Result<Vec<String>, PaddockError> {
        let mut pickles = Vec::new();
        let mut pending = vec![self.cache_dir.clone()];
        while let Some(dir) = pending.pop() {
            pickles.extend(self.pickles_in(&dir)?);
            pending.extend(self.subdirectories(&dir)?);
        }
        Ok(pickles
            .iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect())
    }

    fn subdirectories(&self, dir: &Path) -> Result<Vec<PathBuf>, PaddockError> {
        Ok(self
            .entries(dir)?
            .into_iter()
            .filter(|p| p.is_dir())
            .collect())
    }

    fn pickles_in(&self, dir: &Path) -> Result<Vec<PathBuf>, PaddockError> {
        Ok(self
            .entries(dir)?
            .into_iter()
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == PICKLE_EXTENSION))
            .collect())
    }

    fn entries(&self, dir: &Path) -> Result<Vec<PathBuf>, PaddockError> {
        let scan_error = |e| PaddockError::CacheScanError {
            path: dir.display().to_string(),
            source: e,
        };
        fs::read_dir(dir)
            .map_err(scan_error)?
            .map(|entry| entry.map(|e| e.path()).map_err(scan_error))
            .collect()
    }

    /// Appends `rows`, or replaces the whole file when `append` is false. The
    /// header is written whenever the file starts out empty.
    fn write_rows(&self, rows: &[IndexRow], append: bool) -> Result<(), PaddockError> {
        let path = self.index_path.display().to_string();
        let write_error = |e: csv::Error| PaddockError::IndexWriteError {
            path: path.clone(),
            source: e,
        };
        let write_header = !append || !self.index_path.is_file();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&self.index_path)
            .map_err(|e| write_error(e.into()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        for row in rows {
            writer.serialize(row).map_err(write_error)?;
        }
        writer.flush().map_err(|e| write_error(e.into()))?;
        Ok(())
    }
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn nested_cache() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let session_dir = temp_dir
            .path()
            .join("2023")
            .join("Test_GP")
            .join("2023-07-01_Practice_1");
        fs::create_dir_all(&session_dir).unwrap();
        File::create(session_dir.join("dummy.ff1pkl")).unwrap();
        File::create(temp_dir.path().join("fastf1.duckdb")).unwrap();
        temp_dir
    }

    #[test]
    fn test_session_codes() {
        assert_eq!(session_code("Practice 2"), Some("FP2"));
        assert_eq!(session_code("Sprint Shootout"), Some("SS"));
        assert_eq!(session_code("Warm Up"), None);
        assert_eq!(session_name("R"), Some("Race"));
        assert_eq!(session_name("X"), None);
    }

    #[test]
    fn test_build_creates_then_skips_known_sessions() {
        let cache = nested_cache();
        let builder = SessionIndexBuilder::new(cache.path());

        assert_eq!(builder.build().unwrap(), 1);
        let rows = read_index(builder.index_path()).unwrap();
        assert_eq!(
            rows,
            vec![IndexRow {
                session_id: "2023_Test_GP_FP1".to_string(),
                year: "2023".to_string(),
                event_name: "Test GP".to_string(),
                event_date: "2023-07-01".to_string(),
                session_type: "Practice 1".to_string(),
                sid: "FP1".to_string(),
            }]
        );

        // calling again should not add rows
        assert_eq!(builder.build().unwrap(), 0);
        assert_eq!(read_index(builder.index_path()).unwrap().len(), 1);
    }

    #[test]
    fn test_flat_file_uses_stem_as_session_id() {
        let temp_dir = TempDir::new().unwrap();
        let name = "2018_2018-03-25_Australian_Grand_Prix_FP1.ff1pkl";
        File::create(temp_dir.path().join(name)).unwrap();

        let builder = SessionIndexBuilder::new(temp_dir.path());
        assert_eq!(builder.build().unwrap(), 1);

        let rows = read_index(builder.index_path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].session_id, "2018_2018-03-25_Australian_Grand_Prix_FP1");
        assert_eq!(rows[0].sid, "FP1");
        assert_eq!(rows[0].event_name, "Australian Grand Prix");
        assert_eq!(rows[0].session_type, "Practice 1");
    }

    #[test]
    fn test_new_sessions_are_appended_in_order() {
        let cache = nested_cache();
        let builder = SessionIndexBuilder::new(cache.path());
        builder.build().unwrap();

        for name in [
            "2023_2023-07-02_Test_GP_R.ff1pkl",
            "2022_2022-05-29_Monaco_Grand_Prix_Q.ff1pkl",
        ] {
            File::create(cache.path().join(name)).unwrap();
        }
        assert_eq!(builder.build().unwrap(), 2);

        let ids: Vec<String> = read_index(builder.index_path())
            .unwrap()
            .into_iter()
            .map(|r| r.session_id)
            .collect();
        assert_eq!(
            ids,
            vec![
                "2023_Test_GP_FP1",
                "2022_2022-05-29_Monaco_Grand_Prix_Q",
                "2023_2023-07-02_Test_GP_R",
            ]
        );
    }

    #[test]
    fn test_unrecognised_names_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        File::create(temp_dir.path().join("random_file.ff1pkl")).unwrap();
        let unknown_session = temp_dir
            .path()
            .join("2021")
            .join("Imola")
            .join("2021-04-17_Warm_Up");
        fs::create_dir_all(&unknown_session).unwrap();
        File::create(unknown_session.join("x.ff1pkl")).unwrap();

        let builder = SessionIndexBuilder::new(temp_dir.path());
        assert_eq!(builder.build().unwrap(), 0);
        assert!(!builder.index_path().exists());
    }

    #[test]
    fn test_missing_pickles_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        File::create(temp_dir.path().join("fastf1.duckdb")).unwrap();

        let result = SessionIndexBuilder::new(temp_dir.path()).build();
        match result {
            Err(PaddockError::NoCachedSessions { .. }) => {}
            _ => panic!("Expected NoCachedSessions error"),
        }
    }

    const LEGACY_INDEX: &str = "year,event_name,event_date,session_type,sid\n2023,Test GP,2023-07-01,Practice 1,FP1\n";

    #[test]
    fn test_legacy_index_rows_get_derived_ids() {
        let temp_dir = TempDir::new().unwrap();
        let index_path = temp_dir.path().join(INDEX_FILE_NAME);
        fs::write(&index_path, LEGACY_INDEX).unwrap();

        let rows = read_index(&index_path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].session_id, "2023_Test_GP_FP1");
        assert_eq!(rows[0].session_type, "Practice 1");
    }

    #[test]
    fn test_legacy_index_is_upgraded_when_extended() {
        let cache = nested_cache();
        let index_path = cache.path().join(INDEX_FILE_NAME);
        fs::write(&index_path, LEGACY_INDEX).unwrap();
        File::create(cache.path().join("2023_2023-07-02_Test_GP_R.ff1pkl")).unwrap();

        let builder = SessionIndexBuilder::new(cache.path());
        // the nested FP1 session is already listed under its legacy key
        assert_eq!(builder.build().unwrap(), 1);

        let contents = fs::read_to_string(&index_path).unwrap();
        assert!(contents.starts_with("session_id,year,event_name,event_date,session_type,sid\n"));
        let ids: Vec<String> = read_index(&index_path)
            .unwrap()
            .into_iter()
            .map(|r| r.session_id)
            .collect();
        assert_eq!(ids, vec!["2023_Test_GP_FP1", "2023_2023-07-02_Test_GP_R"]);

        assert_eq!(builder.build().unwrap(), 0);
        assert_eq!(read_index(&index_path).unwrap().len(), 2);
    }

    #[test]
    fn test_flat_files_are_found_in_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let year_dir = temp_dir.path().join("2024");
        fs::create_dir_all(&year_dir).unwrap();
        File::create(year_dir.join("2024_2024-03-02_Bahrain_Grand_Prix_R.ff1pkl")).unwrap();

        let builder = SessionIndexBuilder::new(temp_dir.path());
        assert_eq!(builder.build().unwrap(), 1);

        let rows = read_index(builder.index_path()).unwrap();
        assert_eq!(rows[0].session_id, "2024_2024-03-02_Bahrain_Grand_Prix_R");
        assert_eq!(rows[0].event_name, "Bahrain Grand Prix");
        assert_eq!(rows[0].session_type, "Race");
    }
}
