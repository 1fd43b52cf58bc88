//! Treatment and drug reference data resolved at compile time.
//!
//! Criteria such as `HAS_HAD_TREATMENT[CAPECITABINE+OXALIPLATIN]` name
//! treatments and drugs by text. The compiler resolves those names through a
//! [`TreatmentDatabase`] so that unknown names are rejected when a trial is
//! loaded, never while a patient is being evaluated.

use std::collections::{BTreeSet, HashMap};

/// A single drug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Drug {
    /// Canonical drug name.
    pub name: String,
    /// Drug category (e.g. "CHEMOTHERAPY", "IMMUNOTHERAPY").
    pub category: String,
}

impl Drug {
    /// Creates a drug.
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }
}

/// A named treatment, possibly combining several drugs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Treatment {
    /// Canonical treatment name.
    pub name: String,
    /// Whether the treatment is systemic (drug-based) rather than local.
    pub is_systemic: bool,
    /// Drugs the treatment is composed of.
    pub drugs: BTreeSet<Drug>,
}

impl Treatment {
    /// Creates a systemic treatment from its drugs.
    pub fn systemic(name: impl Into<String>, drugs: impl IntoIterator<Item = Drug>) -> Self {
        Self {
            name: name.into(),
            is_systemic: true,
            drugs: drugs.into_iter().collect(),
        }
    }

    /// Creates a non-systemic treatment (surgery, radiotherapy, ...).
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_systemic: false,
            drugs: BTreeSet::new(),
        }
    }
}

/// Lookup of treatments and drugs by name.
///
/// Absence is reported as `None`; the compiler turns it into a
/// [`CompileError`](crate::CompileError).
pub trait TreatmentDatabase: Send + Sync {
    /// Finds a treatment by its name.
    fn find_treatment_by_name(&self, name: &str) -> Option<Treatment>;

    /// Finds a drug by its name.
    fn find_drug_by_name(&self, name: &str) -> Option<Drug>;
}

/// In-memory [`TreatmentDatabase`] with case- and whitespace-insensitive names.
///
/// Names are normalised to upper case with inner spaces replaced by `_`, so
/// `"Capecitabine oxaliplatin"` and `"CAPECITABINE_OXALIPLATIN"` are the same key.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTreatmentDatabase {
    treatments: HashMap<String, Treatment>,
    drugs: HashMap<String, Drug>,
}

impl InMemoryTreatmentDatabase {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a treatment; its drugs are registered as well.
    pub fn with_treatment(mut self, treatment: Treatment) -> Self {
        for drug in &treatment.drugs {
            self.drugs.insert(normalize_name(&drug.name), drug.clone());
        }
        self.treatments
            .insert(normalize_name(&treatment.name), treatment);
        self
    }

    /// Registers a drug.
    pub fn with_drug(mut self, drug: Drug) -> Self {
        self.drugs.insert(normalize_name(&drug.name), drug);
        self
    }

    /// Number of known treatments.
    pub fn treatment_count(&self) -> usize {
        self.treatments.len()
    }

    /// Number of known drugs.
    pub fn drug_count(&self) -> usize {
        self.drugs.len()
    }
}

impl TreatmentDatabase for InMemoryTreatmentDatabase {
    fn find_treatment_by_name(&self, name: &str) -> Option<Treatment> {
        self.treatments.get(&normalize_name(name)).cloned()
    }

    fn find_drug_by_name(&self, name: &str) -> Option<Drug> {
        self.drugs.get(&normalize_name(name)).cloned()
    }
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}
