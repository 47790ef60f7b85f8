use serde::{Deserialize, Serialize};

pub const REPORT_COLUMNS: [&str; 5] = ["Kit", "Constituant", "Emplacement", "Quantité", "Nom"];

/// One reconstructed picking line. Every field is kept as the raw token text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Kit")]
    pub kit: String,
    #[serde(rename = "Constituant")]
    pub constituant: String,
    #[serde(rename = "Emplacement")]
    pub emplacement: String,
    #[serde(rename = "Quantité")]
    pub quantite: String,
    #[serde(rename = "Nom")]
    pub nom: String,
}

impl Record {
    pub fn cells(&self) -> [&str; 5] {
        [
            &self.kit,
            &self.constituant,
            &self.emplacement,
            &self.quantite,
            &self.nom,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub sections_found: usize,
    pub sections_skipped: usize,
    pub kit_occurrences: usize,
    pub records_extracted: usize,
    pub records_discarded: usize,
    pub duplicates_removed: usize,
    pub merged_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct KitColorEntry {
    pub kit: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRunManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub input_path: String,
    pub input_sha256: Option<String>,
    pub output_path: String,
    pub from_text: bool,
    pub stats: ExtractionStats,
    pub kit_colors: Vec<KitColorEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractResponse<'a> {
    pub columns: [&'static str; 5],
    pub stats: &'a ExtractionStats,
    pub rows: &'a [Record],
}
