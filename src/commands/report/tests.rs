use std::cmp::Ordering;
use std::fs;

use proptest::prelude::*;

use super::build_merged_table;
use super::colors::{KitColor, KitColorMap, Rgb, parse_kit_color};
use super::location::{LocationKey, LocationKeyer, normalize_location};
use super::merge::merge_tables;
use super::pdf_text::split_pages;
use super::records::{RecordScanner, ScanOutcome, SkipReason, extract_records};
use super::render::{
    PageLayout, column_widths, encode_win_ansi, fit_text, render_report, text_width,
};
use super::sections::{Section, split_sections};
use crate::model::Record;

fn section(tokens: &[&'static str]) -> Section<'static> {
    Section {
        index: 0,
        tokens: tokens.to_vec(),
    }
}

fn record(kit: &str, constituant: &str, emplacement: &str, quantite: &str, nom: &str) -> Record {
    Record {
        kit: kit.to_string(),
        constituant: constituant.to_string(),
        emplacement: emplacement.to_string(),
        quantite: quantite.to_string(),
        nom: nom.to_string(),
    }
}

fn keyer() -> LocationKeyer {
    LocationKeyer::new().expect("location regex should compile")
}

const SAMPLE_DOCUMENT: &str = "\
Bon de preparation 2024-03
Atelier montage
Sorties des KITS
KIT-A Kit freinage avant
KIT-A C-100 X 12 4 Plaquette frein CSFAME
KIT-A C-200 3 2 Disque ventile 280mm CSFAME
KIT-A C-300 A4 1 Etrier BSFGK
Sorties des KITS
KIT-B Kit eclairage
KIT-B C-900 Y 3 6 Ampoule H7 CSFAME
KIT-B C-910 12A 1 Faisceau CSFAME
Sorties des KITS
KIT-C
Sorties des KITS
KIT-A Kit freinage avant
KIT-A C-100 X 12 4 Plaquette frein CSFAME
";

#[test]
fn split_sections_discards_preamble_and_short_sections() {
    let split = split_sections(SAMPLE_DOCUMENT);

    assert_eq!(split.sections.len(), 3);
    assert_eq!(split.skipped, 1);
    assert_eq!(split.sections[0].kit(), "KIT-A");
    assert_eq!(split.sections[1].kit(), "KIT-B");
    assert_eq!(split.sections[2].index, 3);
    assert!(!split.sections[0].tokens.contains(&"Atelier"));
}

#[test]
fn split_sections_on_text_without_marker_is_empty() {
    let split = split_sections("Atelier montage\nKIT-A C-100 X 12 4 Plaquette");
    assert!(split.sections.is_empty());
    assert_eq!(split.skipped, 0);
}

#[test]
fn zone_coded_location_consumes_two_tokens() {
    let tokens = section(&["K1", "K1", "CompA", "X", "5", "3", "WidgetA", "CSFAME"]);

    let extracted = extract_records(&tokens);

    assert_eq!(
        extracted.records,
        vec![record("K1", "CompA", "X 5", "3", "WidgetA")]
    );
    assert_eq!(extracted.kit_occurrences, 1);
    assert_eq!(extracted.discarded, 0);
}

#[test]
fn kit_header_alone_never_produces_a_record() {
    let tokens = section(&["K1", "CompA", "X", "5", "3", "WidgetA", "CSFAME"]);

    let extracted = extract_records(&tokens);

    assert!(extracted.records.is_empty());
    assert_eq!(extracted.kit_occurrences, 0);
}

#[test]
fn name_runs_until_sentinel_and_sentinel_is_not_reused() {
    let tokens = section(&[
        "K7", "Kit", "moteur", "K7", "P-1", "B12", "2", "Joint", "de", "culasse", "BSFGK", "K7",
        "P-2", "Y", "4", "10", "Vis", "M8", "CSFAME", "fin",
    ]);

    let extracted = extract_records(&tokens);

    assert_eq!(
        extracted.records,
        vec![
            record("K7", "P-1", "B12", "2", "Joint de culasse"),
            record("K7", "P-2", "Y 4", "10", "Vis M8"),
        ]
    );
}

#[test]
fn name_without_sentinel_runs_to_section_end() {
    let tokens = section(&["K2", "K2", "P-9", "C3", "1", "Capot", "arriere"]);

    let extracted = extract_records(&tokens);

    assert_eq!(
        extracted.records,
        vec![record("K2", "P-9", "C3", "1", "Capot arriere")]
    );
}

#[test]
fn name_without_sentinel_overlaps_following_candidate() {
    let tokens = section(&[
        "K3", "K3", "P-1", "A1", "1", "Cale", "K3", "P-2", "A2", "5", "Goupille",
    ]);

    let extracted = extract_records(&tokens);

    assert_eq!(
        extracted.records,
        vec![
            record("K3", "P-1", "A1", "1", "Cale K3 P-2 A2 5 Goupille"),
            record("K3", "P-2", "A2", "5", "Goupille"),
        ]
    );
}

#[test]
fn truncated_candidates_are_discarded_not_emitted() {
    let near_end = section(&["K1", "a", "b", "c", "d", "K1", "P-1", "X", "4"]);
    let outcomes = RecordScanner::new(&near_end).collect::<Vec<ScanOutcome>>();
    assert_eq!(
        outcomes,
        vec![ScanOutcome::Discarded {
            position: 5,
            reason: SkipReason::TruncatedRecord,
        }]
    );

    // Enough tokens for the plain layout but the zone code needs one more.
    let zone_short = section(&["K1", "a", "b", "c", "d", "K1", "P-1", "X", "4", "2"]);
    let outcomes = RecordScanner::new(&zone_short).collect::<Vec<ScanOutcome>>();
    assert_eq!(
        outcomes,
        vec![ScanOutcome::Discarded {
            position: 5,
            reason: SkipReason::TruncatedRecord,
        }]
    );
}

#[test]
fn sentinel_right_after_quantity_discards_candidate() {
    let tokens = section(&["K1", "K1", "P-1", "B2", "3", "CSFAME", "K1", "P-2", "B3", "1", "Axe"]);

    let outcomes = RecordScanner::new(&tokens).collect::<Vec<ScanOutcome>>();

    assert_eq!(
        outcomes,
        vec![
            ScanOutcome::Discarded {
                position: 1,
                reason: SkipReason::EmptyName,
            },
            ScanOutcome::Record(record("K1", "P-2", "B3", "1", "Axe")),
        ]
    );
}

#[test]
fn normalize_location_follows_prefix_then_join() {
    assert_eq!(normalize_location("12 A"), "S-12A");
    assert_eq!(normalize_location("X 5"), "X5");
    assert_eq!(normalize_location("3"), "S-3");
    assert_eq!(normalize_location("A4"), "A4");
    assert_eq!(normalize_location("S-12A"), "S-12A");
    assert_eq!(normalize_location("1 2 3"), "S-1 2 3");
    assert_eq!(normalize_location(""), "");
}

proptest! {
    #[test]
    fn normalize_location_is_idempotent(raw in "\\PC{0,12}") {
        let once = normalize_location(&raw);
        prop_assert_eq!(normalize_location(&once), once);
    }

    #[test]
    fn normalize_location_is_idempotent_on_location_shapes(
        raw in "([0-9]{1,3}|[XY]|[A-Z]{1,2}[0-9]{0,3})( [0-9A-Z]{1,3}){0,2}"
    ) {
        let once = normalize_location(&raw);
        prop_assert_eq!(normalize_location(&once), once);
    }

    #[test]
    fn location_key_order_is_total_and_antisymmetric(
        left in "[A-Z]{0,2}[0-9]{0,3}[-A-Z0-9]{0,2}",
        right in "[A-Z]{0,2}[0-9]{0,3}[-A-Z0-9]{0,2}",
    ) {
        let keyer = keyer();
        let (left_key, right_key) = (keyer.key(&left), keyer.key(&right));
        prop_assert_eq!(left_key.cmp(&right_key), right_key.cmp(&left_key).reverse());
        prop_assert_eq!(left_key.cmp(&right_key) == Ordering::Equal, left_key == right_key);
    }
}

#[test]
fn location_key_splits_letters_and_number() {
    let keyer = keyer();

    assert_eq!(
        keyer.key("S123"),
        LocationKey::Coded {
            prefix: "S".to_string(),
            digits: "123".to_string(),
        }
    );
    assert_eq!(
        keyer.key("X12B"),
        LocationKey::Coded {
            prefix: "X".to_string(),
            digits: "12".to_string(),
        }
    );
    assert_eq!(keyer.key("S-12A"), LocationKey::Raw("S-12A".to_string()));
}

#[test]
fn location_key_compares_numbers_numerically() {
    let keyer = keyer();

    assert!(keyer.key("X9") < keyer.key("X10"));
    assert!(keyer.key("X010") == keyer.key("X10"));
    assert!(keyer.key("A99") < keyer.key("B1"));
    assert!(keyer.key("X99999999999999999999999") > keyer.key("X100"));
}

#[test]
fn raw_locations_sort_by_text_among_coded_ones() {
    let keyer = keyer();

    assert!(keyer.key("S-12A") < keyer.key("X5"));
    assert!(keyer.key("S7") < keyer.key("S-12A"));
    assert!(keyer.key("S-12A") < keyer.key("S-3"));
    assert!(keyer.key("S0") < keyer.key("S"));
}

#[test]
fn merge_tables_drops_exact_duplicates_and_sorts_stably() {
    let first = vec![
        record("K1", "P-1", "X10", "1", "Vis"),
        record("K1", "P-2", "X9", "1", "Ecrou"),
        record("K1", "P-3", "X10", "2", "Rondelle"),
    ];
    let second = vec![
        record("K2", "P-4", "A1", "1", "Clip"),
        record("K1", "P-1", "X10", "1", "Vis"),
        record("K1", "P-1", "X10", "3", "Vis"),
    ];

    let merged = merge_tables(vec![first, second], &keyer());

    assert_eq!(merged.duplicates_removed, 1);
    assert_eq!(
        merged.rows,
        vec![
            record("K2", "P-4", "A1", "1", "Clip"),
            record("K1", "P-2", "X9", "1", "Ecrou"),
            record("K1", "P-1", "X10", "1", "Vis"),
            record("K1", "P-3", "X10", "2", "Rondelle"),
            record("K1", "P-1", "X10", "3", "Vis"),
        ]
    );
}

#[test]
fn merge_tables_of_nothing_is_empty() {
    let merged = merge_tables(Vec::<Vec<Record>>::new(), &keyer());
    assert!(merged.rows.is_empty());
    assert_eq!(merged.duplicates_removed, 0);
}

#[test]
fn pipeline_builds_sorted_unique_table() {
    let output = build_merged_table(SAMPLE_DOCUMENT).expect("pipeline should succeed");

    assert_eq!(
        output.rows,
        vec![
            record("KIT-A", "C-300", "A4", "1", "Etrier"),
            record("KIT-B", "C-910", "S-12A", "1", "Faisceau"),
            record("KIT-A", "C-200", "S-3", "2", "Disque ventile 280mm"),
            record("KIT-A", "C-100", "X12", "4", "Plaquette frein"),
            record("KIT-B", "C-900", "Y3", "6", "Ampoule H7"),
        ]
    );
    assert_eq!(output.stats.sections_found, 4);
    assert_eq!(output.stats.sections_skipped, 1);
    assert_eq!(output.stats.records_extracted, 6);
    assert_eq!(output.stats.duplicates_removed, 1);
    assert_eq!(output.stats.merged_rows, 5);
}

#[test]
fn pipeline_is_deterministic() {
    let first = build_merged_table(SAMPLE_DOCUMENT).expect("pipeline should succeed");
    let second = build_merged_table(SAMPLE_DOCUMENT).expect("pipeline should succeed");
    assert_eq!(first, second);
}

#[test]
fn pipeline_rows_are_unique_and_ordered() {
    let output = build_merged_table(SAMPLE_DOCUMENT).expect("pipeline should succeed");
    let keyer = keyer();

    for (index, row) in output.rows.iter().enumerate() {
        assert!(!output.rows[index + 1..].contains(row), "duplicate row {row:?}");
    }
    for pair in output.rows.windows(2) {
        assert!(keyer.key(&pair[0].emplacement) <= keyer.key(&pair[1].emplacement));
    }
}

#[test]
fn empty_text_yields_empty_table() {
    let output = build_merged_table("").expect("empty text is a valid document");
    assert!(output.rows.is_empty());
    assert_eq!(output.stats.sections_found, 0);
    assert_eq!(output.stats.merged_rows, 0);
}

#[test]
fn split_pages_drops_trailing_blank_pages_and_nuls() {
    let pages = split_pages("Sorties des KITS\nKIT-A\u{0000}\u{000C}KIT-A C-1\u{000C}\n\u{000C}");
    assert_eq!(pages, vec!["Sorties des KITS\nKIT-A", "KIT-A C-1"]);
}

#[test]
fn rgb_parses_common_hex_forms() {
    assert_eq!("#ff8000".parse::<Rgb>(), Ok(Rgb::new(0xff, 0x80, 0x00)));
    assert_eq!("0x00FF00".parse::<Rgb>(), Ok(Rgb::new(0x00, 0xff, 0x00)));
    assert_eq!("#0af".parse::<Rgb>(), Ok(Rgb::new(0x00, 0xaa, 0xff)));
    assert_eq!("123456".parse::<Rgb>(), Ok(Rgb::new(0x12, 0x34, 0x56)));
    assert!("#12345".parse::<Rgb>().is_err());
    assert!("#gg0000".parse::<Rgb>().is_err());
    assert_eq!(Rgb::new(0xf5, 0xf5, 0xf5).to_string(), "#f5f5f5");
}

#[test]
fn kit_color_pairs_build_mapping_with_white_default() {
    let pairs = vec![
        parse_kit_color("KIT-A=#ff0000").expect("valid pair"),
        parse_kit_color("KIT-B = #00ff00").expect("valid pair"),
        parse_kit_color("KIT-A=#0000ff").expect("valid pair"),
    ];

    let colors = KitColorMap::from_pairs(pairs);

    assert_eq!(colors.len(), 2);
    assert_eq!(colors.color_for("KIT-A"), Rgb::new(0, 0, 0xff));
    assert_eq!(colors.color_for("KIT-B"), Rgb::new(0, 0xff, 0));
    assert_eq!(colors.color_for("KIT-Z"), Rgb::WHITE);
    assert_eq!(colors.entries()[0].color, "#0000ff");
}

#[test]
fn kit_color_rejects_malformed_pairs() {
    assert!(parse_kit_color("KIT-A").is_err());
    assert!(parse_kit_color("=#ffffff").is_err());
    assert!(parse_kit_color("KIT-A=blue").is_err());
}

#[test]
fn fit_text_truncates_with_ellipsis() {
    assert_eq!(fit_text("Vis", 100.0, 9.0), "Vis");

    let fitted = fit_text("Plaquette de frein avant gauche renforcee", 60.0, 9.0);
    assert!(fitted.ends_with("..."));
    assert!(text_width(&fitted, 9.0) <= 60.0);
}

#[test]
fn column_widths_fit_usable_page_width() {
    let layout = PageLayout::default();
    let rows = vec![record("KIT-A", "C-100", "X12", "4", &"Plaquette ".repeat(40))];

    let widths = column_widths(&rows, &layout);

    let total = widths.iter().sum::<f32>();
    assert!(total <= layout.width - 2.0 * layout.margin + 0.01);
    assert!(widths[4] > widths[0]);
}

#[test]
fn win_ansi_encoding_keeps_latin1_and_replaces_the_rest() {
    assert_eq!(encode_win_ansi("Quantité"), b"Quantit\xe9".to_vec());
    assert_eq!(encode_win_ansi("a–b"), vec![b'a', 0x96, b'b']);
    assert_eq!(encode_win_ansi("漢"), b"?".to_vec());
}

#[test]
fn render_report_paginates_and_writes_pdf() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("reports").join("merged.pdf");
    let rows = (0..120)
        .map(|index| record("KIT-A", "C-1", &format!("X{index}"), "1", "Vis"))
        .collect::<Vec<Record>>();
    let colors = KitColorMap::from_pairs(vec![KitColor {
        kit: "KIT-A".to_string(),
        color: Rgb::new(0xff, 0xcc, 0x00),
    }]);
    let layout = PageLayout::default();

    let pages = render_report(&rows, &colors, Some("Sorties"), &output, &layout)
        .expect("render should succeed");

    let first_page = layout.rows_per_page(true);
    let expected = 1 + (rows.len() - first_page).div_ceil(layout.rows_per_page(false));
    assert_eq!(pages, expected);

    let bytes = fs::read(&output).expect("report file");
    assert!(bytes.starts_with(b"%PDF-"));
    let document = lopdf::Document::load(&output).expect("report should load back");
    assert_eq!(document.get_pages().len(), expected);
}

#[test]
fn render_report_of_empty_table_has_one_page() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("empty.pdf");

    let pages = render_report(
        &[],
        &KitColorMap::default(),
        None,
        &output,
        &PageLayout::default(),
    )
    .expect("empty report should render");

    assert_eq!(pages, 1);
    assert!(output.exists());
}

#[test]
fn render_failure_leaves_no_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").expect("write blocker");
    let output = blocker.join("report.pdf");

    let result = render_report(
        &[record("K1", "P-1", "X1", "1", "Vis")],
        &KitColorMap::default(),
        None,
        &output,
        &PageLayout::default(),
    );

    assert!(result.is_err());
    assert!(!output.exists());
    let leftovers = fs::read_dir(dir.path()).expect("read tempdir").count();
    assert_eq!(leftovers, 1);
}
