/*!
 * Shared terminology dictionary with transactional merges.
 *
 * The dictionary maps source-language terms to target-language translations
 * with an optional gender annotation, and is shared by every page processed
 * in a run. Merges are serialized behind a single lock: each page's merge is
 * one atomic read-modify-write-persist transaction, so concurrent pages can
 * never interleave conflicting updates to the same term and a crash loses at
 * most one page's new terms.
 *
 * On disk the dictionary is a human-editable JSON document keyed by language
 * pair (e.g. `ja_to_zh`). Term values are stored in the annotated form the
 * translation model also produces: `奇庫魯(男性)` carries a male tag,
 * `艾諾梅(女性)` a female one, and a bare string has unknown gender.
 */

use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::TerminologyError;

/// Suffix marking a male name in annotated term values
const MALE_MARKER: &str = "(男性)";
/// Suffix marking a female name in annotated term values
const FEMALE_MARKER: &str = "(女性)";

/// Gender annotation attached to a terminology entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
    /// Annotated as male
    Male,
    /// Annotated as female
    Female,
    /// No annotation yet
    #[default]
    Unknown,
}

impl Gender {
    /// Whether a concrete gender has been assigned
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// One terminology entry: target-language translation plus gender tag.
///
/// Serialized as the annotated string form (`target(男性)` etc.) so the
/// persisted dictionary and per-page result files stay human-editable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TermEntry {
    /// Target-language translation
    pub target: String,
    /// Gender annotation, `Unknown` when absent
    pub gender: Gender,
}

impl TermEntry {
    /// Entry with no gender annotation
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into(), gender: Gender::Unknown }
    }

    /// Entry with an explicit gender tag
    pub fn with_gender(target: impl Into<String>, gender: Gender) -> Self {
        Self { target: target.into(), gender }
    }

    /// Parse an annotated value: a trailing `(男性)`/`(女性)` marker becomes
    /// the gender tag, anything else is an unannotated translation.
    pub fn from_annotated(value: &str) -> Self {
        if let Some(target) = value.strip_suffix(MALE_MARKER) {
            Self::with_gender(target, Gender::Male)
        } else if let Some(target) = value.strip_suffix(FEMALE_MARKER) {
            Self::with_gender(target, Gender::Female)
        } else {
            Self::new(value)
        }
    }

    /// Render the annotated string form used on disk and in prompts
    pub fn annotated(&self) -> String {
        match self.gender {
            Gender::Male => format!("{}{}", self.target, MALE_MARKER),
            Gender::Female => format!("{}{}", self.target, FEMALE_MARKER),
            Gender::Unknown => self.target.clone(),
        }
    }
}

impl Serialize for TermEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.annotated())
    }
}

impl<'de> Deserialize<'de> for TermEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_annotated(&value))
    }
}

/// A gender disagreement found during a merge: both sides carry a known tag
/// and they differ. The existing entry wins; the conflict is reported so a
/// human can resolve it in the dictionary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermConflict {
    /// Source-language term
    pub term: String,
    /// Entry already in the dictionary (kept)
    pub existing: TermEntry,
    /// Entry the page proposed (discarded)
    pub incoming: TermEntry,
}

/// Result of one merge transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Terms inserted for the first time
    pub added: usize,
    /// Existing terms whose translation or gender was updated
    pub updated: usize,
    /// Gender disagreements, reported but not auto-resolved
    pub conflicts: Vec<TermConflict>,
}

impl MergeOutcome {
    /// Whether the merge changed the dictionary at all
    pub fn changed(&self) -> bool {
        self.added > 0 || self.updated > 0
    }
}

/// Bookkeeping block in the dictionary file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DictionaryMetadata {
    created_at: String,
    updated_at: String,
    version: String,
    total_terms: usize,
}

impl Default for DictionaryMetadata {
    fn default() -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            created_at: now.clone(),
            updated_at: now,
            version: "1.0".to_string(),
            total_terms: 0,
        }
    }
}

/// On-disk dictionary document. The terms live under a dynamic language-pair
/// key (`ja_to_zh` etc.) next to the metadata block.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct DictionaryFile {
    #[serde(default)]
    metadata: DictionaryMetadata,

    #[serde(flatten)]
    pairs: BTreeMap<String, BTreeMap<String, TermEntry>>,
}

/// Persistent, lock-guarded terminology dictionary shared across pages
pub struct TerminologyStore {
    /// Dictionary file location
    path: PathBuf,
    /// Language-pair key, e.g. `ja_to_zh`
    pair_key: String,
    /// Guarded dictionary state; held across apply-and-persist in `merge`
    inner: Mutex<DictionaryFile>,
}

impl TerminologyStore {
    /// Load the dictionary for a language pair, creating an empty one if the
    /// file does not exist yet. An unreadable file is replaced by a fresh
    /// in-memory dictionary (the file itself is left untouched until the
    /// next successful merge).
    pub fn load(path: impl AsRef<Path>, source_language: &str, target_language: &str) -> Self {
        let path = path.as_ref().to_path_buf();
        let pair_key = format!("{}_to_{}", source_language, target_language);

        let file = if path.exists() {
            match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|raw| serde_json::from_str::<DictionaryFile>(&raw).map_err(|e| e.to_string()))
            {
                Ok(file) => {
                    let count = file.pairs.get(&pair_key).map_or(0, |terms| terms.len());
                    info!("Loaded {} terminology entries from {}", count, path.display());
                    file
                }
                Err(e) => {
                    warn!(
                        "Failed to load terminology dictionary {}: {}; starting with an empty dictionary",
                        path.display(),
                        e
                    );
                    DictionaryFile::default()
                }
            }
        } else {
            debug!("Creating new terminology dictionary at {}", path.display());
            DictionaryFile::default()
        };

        Self { path, pair_key, inner: Mutex::new(file) }
    }

    /// Look up the entry for a source-language term
    pub fn lookup(&self, term: &str) -> Option<TermEntry> {
        self.inner.lock().pairs.get(&self.pair_key)?.get(term).cloned()
    }

    /// Number of terms for this language pair
    pub fn len(&self) -> usize {
        self.inner.lock().pairs.get(&self.pair_key).map_or(0, |terms| terms.len())
    }

    /// Whether the dictionary holds no terms for this language pair
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all terms for this language pair
    pub fn all_terms(&self) -> BTreeMap<String, TermEntry> {
        self.inner
            .lock()
            .pairs
            .get(&self.pair_key)
            .cloned()
            .unwrap_or_default()
    }

    /// Terms whose source key appears verbatim in any of the given texts.
    /// OCR-confusable variants are handled by the parser's repair pass.
    pub fn subset_for_texts<'a, I>(&self, texts: I) -> BTreeMap<String, TermEntry>
    where
        I: IntoIterator<Item = &'a str> + Clone,
    {
        let inner = self.inner.lock();
        let Some(terms) = inner.pairs.get(&self.pair_key) else {
            return BTreeMap::new();
        };

        terms
            .iter()
            .filter(|(term, _)| texts.clone().into_iter().any(|text| text.contains(term.as_str())))
            .map(|(term, entry)| (term.clone(), entry.clone()))
            .collect()
    }

    /// Search entries whose source term or translation contains the keyword
    pub fn search(&self, keyword: &str) -> BTreeMap<String, TermEntry> {
        let inner = self.inner.lock();
        let Some(terms) = inner.pairs.get(&self.pair_key) else {
            return BTreeMap::new();
        };

        terms
            .iter()
            .filter(|(term, entry)| term.contains(keyword) || entry.target.contains(keyword))
            .map(|(term, entry)| (term.clone(), entry.clone()))
            .collect()
    }

    /// Remove a term, persisting the dictionary if it was present
    pub fn remove(&self, term: &str) -> Result<bool, TerminologyError> {
        let mut inner = self.inner.lock();
        let removed = inner
            .pairs
            .get_mut(&self.pair_key)
            .map_or(false, |terms| terms.remove(term).is_some());

        if removed {
            info!("Removed terminology entry: {}", term);
            self.persist_locked(&mut inner)?;
        }
        Ok(removed)
    }

    /// Merge newly discovered terms into the dictionary.
    ///
    /// One atomic transaction: the lock is held across applying the merge
    /// policy and persisting to disk. Policy per term:
    /// - no existing entry: insert;
    /// - genders compatible (equal, or one side unknown): the incoming
    ///   translation string replaces the stored one, the first-set known
    ///   gender is preserved;
    /// - both genders known and different: the existing entry wins and the
    ///   disagreement is reported as a conflict.
    pub fn merge<I>(&self, incoming: I) -> Result<MergeOutcome, TerminologyError>
    where
        I: IntoIterator<Item = (String, TermEntry)>,
    {
        let mut inner = self.inner.lock();
        let terms = inner.pairs.entry(self.pair_key.clone()).or_default();

        let mut outcome = MergeOutcome::default();

        for (term, entry) in incoming {
            match terms.get(&term) {
                None => {
                    debug!("New terminology entry: {} -> {}", term, entry.annotated());
                    terms.insert(term, entry);
                    outcome.added += 1;
                }
                Some(existing) => {
                    if existing.gender.is_known()
                        && entry.gender.is_known()
                        && existing.gender != entry.gender
                    {
                        warn!(
                            "Terminology gender conflict for {}: keeping {}, rejecting {}",
                            term,
                            existing.annotated(),
                            entry.annotated()
                        );
                        outcome.conflicts.push(TermConflict {
                            term,
                            existing: existing.clone(),
                            incoming: entry,
                        });
                        continue;
                    }

                    // Last merge wins for the string; the first known gender sticks.
                    let gender = if existing.gender.is_known() { existing.gender } else { entry.gender };
                    let merged = TermEntry::with_gender(entry.target, gender);
                    if &merged != existing {
                        debug!("Updated terminology entry: {} -> {}", term, merged.annotated());
                        terms.insert(term, merged);
                        outcome.updated += 1;
                    }
                }
            }
        }

        if outcome.changed() {
            self.persist_locked(&mut inner)?;
        }

        Ok(outcome)
    }

    /// Write the dictionary to disk while the lock is held. Uses a
    /// temp-file-and-rename so a crash cannot leave a half-written file.
    fn persist_locked(&self, inner: &mut DictionaryFile) -> Result<(), TerminologyError> {
        inner.metadata.updated_at = Utc::now().to_rfc3339();
        inner.metadata.total_terms = inner.pairs.get(&self.pair_key).map_or(0, |terms| terms.len());

        let json = serde_json::to_string_pretty(&*inner)
            .map_err(|e| TerminologyError::PersistFailed(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| TerminologyError::PersistFailed(e.to_string()))?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| TerminologyError::PersistFailed(e.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| TerminologyError::PersistFailed(e.to_string()))?;

        debug!(
            "Terminology dictionary persisted ({} terms)",
            inner.metadata.total_terms
        );
        Ok(())
    }
}
