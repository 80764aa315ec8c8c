use super::{MedicineRepository, SymptomLogRepository};
use crate::error::TrackerResult;
use crate::models::{Medicine, SymptomLog};
use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// A flat JSON array on disk. A missing file reads as an empty collection.
///
/// Records are deserialized strictly. A single malformed entry, such as a dose time of
/// `"25:00"`, fails the whole load with
/// [`TrackerError::Json`](crate::error::TrackerError::Json); nothing admitted through
/// `validate` can produce one, so this only trips on files edited by hand.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_list<T: DeserializeOwned>(&self) -> TrackerResult<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let items: Vec<T> = serde_json::from_reader(reader)?;
        info!("Loaded {} records from {:?}", items.len(), self.path);
        Ok(items)
    }

    fn write_list<T: Serialize>(&self, items: &[T]) -> TrackerResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(file, items)?;
        info!("Saved {} records to {:?}", items.len(), self.path);
        Ok(())
    }
}

impl MedicineRepository for JsonFileRepository {
    fn load(&self) -> TrackerResult<Vec<Medicine>> {
        self.read_list()
    }

    fn save(&self, medicines: &[Medicine]) -> TrackerResult<()> {
        self.write_list(medicines)
    }
}

impl SymptomLogRepository for JsonFileRepository {
    fn load_symptoms(&self) -> TrackerResult<Vec<SymptomLog>> {
        self.read_list()
    }

    fn save_symptoms(&self, logs: &[SymptomLog]) -> TrackerResult<()> {
        self.write_list(logs)
    }
}
