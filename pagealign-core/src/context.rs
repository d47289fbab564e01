//! Read-only lookup tables shared by every unit of a run
//!
//! Tables are loaded once before processing starts and only borrowed after
//! that, so units can run on any number of threads.

use crate::annotation::{IdScheme, TextVersions};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::realign::EntityDictionary;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

/// Page id to IIIF image base url
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IiifIndex {
    urls: HashMap<String, String>,
}

#[derive(Deserialize)]
struct IiifRow {
    pagexml_id: String,
    iiif_base_url: String,
}

impl IiifIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a CSV with `pagexml_id` and `iiif_base_url` columns
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut index = Self::new();
        for row in csv::Reader::from_reader(reader).deserialize() {
            let row: IiifRow = row?;
            index.insert(row.pagexml_id, row.iiif_base_url);
        }
        Ok(index)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        let index = Self::from_reader(file)?;
        log::info!("loaded {} IIIF base urls from {}", index.len(), path.display());
        Ok(index)
    }

    pub fn insert(&mut self, page_id: impl Into<String>, base_url: impl Into<String>) {
        self.urls.insert(page_id.into(), base_url.into());
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Base url for a page; an unknown page cannot produce image targets
    pub fn base_url(&self, page_id: &str) -> Result<&str> {
        self.urls
            .get(page_id)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownPage(page_id.to_string()))
    }
}

/// One row of the archive metadata table, all columns kept
pub type MetadataRecord = BTreeMap<String, String>;

/// Archive metadata describing which scans belong to which inventory entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataTable {
    records: Vec<MetadataRecord>,
}

impl MetadataTable {
    pub fn new(records: Vec<MetadataRecord>) -> Self {
        Self { records }
    }

    /// Read a CSV with at least `Indexnr`, `Scan-begin` and `Scan-Eind` columns
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let records = csv::Reader::from_reader(reader)
            .deserialize()
            .collect::<std::result::Result<Vec<MetadataRecord>, _>>()?;
        Ok(Self::new(records))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        let table = Self::from_reader(file)?;
        log::info!("loaded {} metadata records from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record governing the page named `page_name`
    ///
    /// The last two `_` separated parts of the name are the inventory number
    /// and the scan number. A record matches when its `Indexnr` equals the
    /// inventory number and the scan lies within `Scan-begin..=Scan-Eind`.
    /// Several matches are a fatal [`Error::AmbiguousMetadata`].
    pub fn lookup(&self, page_name: &str) -> Result<Option<&MetadataRecord>> {
        let mut parts = page_name.rsplitn(3, '_');
        let (Some(scan), Some(index_nr)) = (parts.next(), parts.next()) else {
            log::warn!("cannot derive inventory and scan number from '{}'", page_name);
            return Ok(None);
        };
        let Ok(scan) = scan.parse::<u64>() else {
            log::warn!("scan number '{}' of '{}' is not a number", scan, page_name);
            return Ok(None);
        };

        let matches: Vec<&MetadataRecord> = self
            .records
            .iter()
            .filter(|r| r.get("Indexnr").map(String::as_str) == Some(index_nr))
            .filter(|r| {
                let bound = |key: &str| r.get(key).and_then(|v| v.trim().parse::<u64>().ok());
                matches!(
                    (bound("Scan-begin"), bound("Scan-Eind")),
                    (Some(begin), Some(end)) if begin <= scan && scan <= end
                )
            })
            .collect();

        match matches.len() {
            0 => {
                log::warn!("no metadata record for '{}'", page_name);
                Ok(None)
            }
            1 => Ok(Some(matches[0])),
            count => Err(Error::AmbiguousMetadata {
                unit: page_name.to_string(),
                count,
            }),
        }
    }
}

/// Text repository versions per unit base name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionTable {
    versions: HashMap<String, TextVersions>,
}

#[derive(Deserialize)]
struct VersionRow {
    external_id: String,
    txt_version: String,
    segmented_version: String,
    conll_version: String,
}

impl VersionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a CSV with `external_id`, `txt_version`, `segmented_version` and
    /// `conll_version` columns
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut table = Self::new();
        for row in csv::Reader::from_reader(reader).deserialize() {
            let row: VersionRow = row?;
            table.insert(
                row.external_id,
                TextVersions {
                    txt: row.txt_version,
                    segmented: row.segmented_version,
                    conll: row.conll_version,
                },
            );
        }
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        let table = Self::from_reader(file)?;
        log::info!("loaded {} text versions from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn insert(&mut self, external_id: impl Into<String>, versions: TextVersions) {
        self.versions.insert(external_id.into(), versions);
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn get(&self, external_id: &str) -> Option<&TextVersions> {
        self.versions.get(external_id)
    }
}

/// Everything a unit needs besides its own input
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: Config,
    pub ids: IdScheme,
    pub iiif: IiifIndex,
    pub metadata: MetadataTable,
    pub versions: VersionTable,
    pub entities: EntityDictionary,
    /// Timestamp written as `generated` on every Web Annotation of the run
    pub generated: DateTime<Utc>,
}

impl RunContext {
    /// Context with empty tables, the embedded entity dictionary and the current time
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            ids: config.id_scheme(),
            config,
            iiif: IiifIndex::new(),
            metadata: MetadataTable::default(),
            versions: VersionTable::new(),
            entities: EntityDictionary::embedded()?,
            generated: Utc::now(),
        })
    }

    pub fn with_iiif(mut self, iiif: IiifIndex) -> Self {
        self.iiif = iiif;
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataTable) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_versions(mut self, versions: VersionTable) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_entities(mut self, entities: EntityDictionary) -> Self {
        self.entities = entities;
        self
    }

    /// Fix the timestamp, for reproducible output
    pub fn with_generated(mut self, generated: DateTime<Utc>) -> Self {
        self.generated = generated;
        self
    }
}
