use tracing::debug;

use super::sections::Section;
use crate::model::Record;

/// Tokens that close the free-text name of a picking line.
pub const NAME_SENTINELS: [&str; 2] = ["CSFAME", "BSFGK"];

/// Zone codes printed as a separate word in front of the rack number ("X 12").
pub const LOCATION_ZONE_CODES: [&str; 2] = ["X", "Y"];

/// Constituant, location, quantity and at least one name word.
pub const MIN_RECORD_TOKENS: usize = 4;

/// Why a section or a record candidate produced nothing. None of these are errors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SkipReason {
    ShortSection,
    TruncatedRecord,
    EmptyName,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShortSection => "short_section",
            Self::TruncatedRecord => "truncated_record",
            Self::EmptyName => "empty_name",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ScanState {
    SeekKit,
    ReadConstituant,
    ReadLocation,
    ReadLocationZoneSuffix,
    ReadQuantity,
    ReadName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Record(Record),
    Discarded { position: usize, reason: SkipReason },
}

#[derive(Default)]
struct Candidate<'a> {
    constituant: &'a str,
    zone: &'a str,
    emplacement: String,
    quantite: &'a str,
    name: Vec<&'a str>,
}

/// Walks a section's tokens and yields one outcome per repeated kit token.
///
/// The header occurrence at position 0 never starts a record. After each candidate the
/// scan resumes right behind that candidate's kit token, so a name running without a
/// sentinel may cover tokens that also start the next candidate.
pub struct RecordScanner<'s, 'a> {
    tokens: &'s [&'a str],
    kit: &'a str,
    position: usize,
}

impl<'s, 'a> RecordScanner<'s, 'a> {
    pub fn new(section: &'s Section<'a>) -> Self {
        Self {
            tokens: &section.tokens,
            kit: section.kit(),
            position: 1,
        }
    }

    fn discard(&mut self, kit_position: usize, reason: SkipReason) -> ScanOutcome {
        self.position = kit_position + 1;
        ScanOutcome::Discarded {
            position: kit_position,
            reason,
        }
    }

    fn finish(&mut self, kit_position: usize, candidate: Candidate<'a>) -> ScanOutcome {
        if candidate.name.is_empty() {
            return self.discard(kit_position, SkipReason::EmptyName);
        }

        self.position = kit_position + 1;
        ScanOutcome::Record(Record {
            kit: self.kit.to_string(),
            constituant: candidate.constituant.to_string(),
            emplacement: candidate.emplacement,
            quantite: candidate.quantite.to_string(),
            nom: candidate.name.join(" "),
        })
    }
}

impl<'a> Iterator for RecordScanner<'_, 'a> {
    type Item = ScanOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        let mut state = ScanState::SeekKit;
        let mut candidate = Candidate::<'a>::default();
        let mut kit_position = self.position;

        loop {
            let token = self.tokens.get(self.position).copied();

            state = match (state, token) {
                (ScanState::SeekKit, None) => return None,
                (ScanState::SeekKit, Some(token)) if token == self.kit => {
                    kit_position = self.position;
                    let remaining = self.tokens.len() - kit_position - 1;
                    if remaining < MIN_RECORD_TOKENS {
                        return Some(self.discard(kit_position, SkipReason::TruncatedRecord));
                    }
                    ScanState::ReadConstituant
                }
                (ScanState::SeekKit, Some(_)) => ScanState::SeekKit,
                (ScanState::ReadName, None) if candidate.name.is_empty() => {
                    return Some(self.discard(kit_position, SkipReason::TruncatedRecord));
                }
                (ScanState::ReadName, None) => return Some(self.finish(kit_position, candidate)),
                (ScanState::ReadName, Some(token)) if NAME_SENTINELS.contains(&token) => {
                    return Some(self.finish(kit_position, candidate));
                }
                (ScanState::ReadName, Some(token)) => {
                    candidate.name.push(token);
                    ScanState::ReadName
                }
                (_, None) => {
                    return Some(self.discard(kit_position, SkipReason::TruncatedRecord));
                }
                (ScanState::ReadConstituant, Some(token)) => {
                    candidate.constituant = token;
                    ScanState::ReadLocation
                }
                (ScanState::ReadLocation, Some(token)) if LOCATION_ZONE_CODES.contains(&token) => {
                    candidate.zone = token;
                    ScanState::ReadLocationZoneSuffix
                }
                (ScanState::ReadLocation, Some(token)) => {
                    candidate.emplacement = token.to_string();
                    ScanState::ReadQuantity
                }
                (ScanState::ReadLocationZoneSuffix, Some(token)) => {
                    candidate.emplacement = format!("{} {}", candidate.zone, token);
                    ScanState::ReadQuantity
                }
                (ScanState::ReadQuantity, Some(token)) => {
                    candidate.quantite = token;
                    ScanState::ReadName
                }
            };
            self.position += 1;
        }
    }
}

#[derive(Debug, Default)]
pub struct SectionRecords {
    pub records: Vec<Record>,
    pub kit_occurrences: usize,
    pub discarded: usize,
}

pub fn extract_records(section: &Section<'_>) -> SectionRecords {
    let mut extracted = SectionRecords::default();

    for outcome in RecordScanner::new(section) {
        extracted.kit_occurrences += 1;
        match outcome {
            ScanOutcome::Record(record) => extracted.records.push(record),
            ScanOutcome::Discarded { position, reason } => {
                debug!(
                    section = section.index,
                    kit = section.kit(),
                    position,
                    reason = reason.as_str(),
                    "discarding record candidate"
                );
                extracted.discarded += 1;
            }
        }
    }

    extracted
}
