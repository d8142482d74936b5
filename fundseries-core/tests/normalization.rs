//! End-to-end normalization: payload → decoder → builder → canonical JSON.

use fundseries_core::{
    CanonicalDate, Correction, CorrectionSet, DateFormat, RecordFormat, Series, SeriesBuilder,
    SourceFormat, UnitSuffix,
};

fn normalize(format: SourceFormat, payload: &str) -> Series {
    SeriesBuilder::for_source(format)
        .build_payload(format, payload)
        .unwrap()
        .series
}

fn to_json(series: &Series) -> String {
    serde_json::to_string(series).unwrap()
}

// ── Per-source fixtures ──────────────────────────────────────────────

#[test]
fn csv_with_header() {
    let series = normalize(
        SourceFormat::CommaSeparatedWithHeader,
        "name,navpu\n2015-01-02,100.0000\n2015-01-05,101.2500\n",
    );
    assert_eq!(
        to_json(&series),
        r#"{"Jan 2, 2015":"100.0000","Jan 5, 2015":"101.2500"}"#
    );
}

#[test]
fn epoch_pair_list() {
    let series = normalize(SourceFormat::BracketedPairListEpoch, "[[1420156800000,98.5]]");
    assert_eq!(to_json(&series), r#"{"Jan 2, 2015":"98.5"}"#);
}

#[test]
fn labeled_blob_drops_damaged_key_with_catalog_correction() {
    let payload = r#"{"thlabels": [
        "NAVpu : <b>1.2345</b><br>Date : Jan 5, 2016",
        "NAVpu : <b>9.9</b><br>Date :  26, 2016",
        "NAVpu : <b>1.2400</b><br>Date : Jan 6, 2016"
    ]}"#;

    let plain = SeriesBuilder::for_source(SourceFormat::LabeledJsonBlob)
        .build_payload(SourceFormat::LabeledJsonBlob, payload)
        .unwrap();
    assert_eq!(plain.report.rejected, 1);
    assert_eq!(plain.report.samples[0].token, "26, 2016");

    let corrections: CorrectionSet = [Correction::Raw(" 26, 2016".into())].into_iter().collect();
    let corrected = SeriesBuilder::for_source(SourceFormat::LabeledJsonBlob)
        .with_corrections(corrections)
        .build_payload(SourceFormat::LabeledJsonBlob, payload)
        .unwrap();
    assert_eq!(corrected.report.rejected, 0);
    assert_eq!(corrected.report.corrected, 1);
    assert_eq!(
        to_json(&corrected.series),
        r#"{"Jan 5, 2016":"1.2345","Jan 6, 2016":"1.2400"}"#
    );
}

#[test]
fn reverse_chron_tab_with_unit_suffix() {
    let payload = "2016-01-06\t1.2400P\n2016-01-05\t1.2345P\n2016-01-05\t1.2000P\n";
    let series = normalize(SourceFormat::TabSeparatedReverseChron, payload);
    // Once reversed, the first-listed of two duplicate lines merges last.
    assert_eq!(
        to_json(&series),
        r#"{"Jan 5, 2016":"1.2345","Jan 6, 2016":"1.2400"}"#
    );
}

#[test]
fn tab_with_header() {
    let series = normalize(
        SourceFormat::TabSeparatedWithHeader,
        "Date\tNAVPS\n2016-01-05\t2.5\n\n2016-01-06\t2.6\n",
    );
    assert_eq!(to_json(&series), r#"{"Jan 5, 2016":"2.5","Jan 6, 2016":"2.6"}"#);
}

#[test]
fn tab_us_slash_index() {
    let series = normalize(SourceFormat::TabSeparated, "01/04/2016\t7000.10\n01/05/2016\t7100\n");
    assert_eq!(to_json(&series), r#"{"Jan 4, 2016":"7000.10","Jan 5, 2016":"7100"}"#);
}

#[test]
fn embedded_json_arrays() {
    let series = normalize(
        SourceFormat::EmbeddedJsonArrays,
        r#"{"category": ["2016-01-05", "2016-01-06", "2016-01-07"], "values": [1.5, 100.0]}"#,
    );
    assert_eq!(to_json(&series), r#"{"Jan 5, 2016":"1.5","Jan 6, 2016":"100.0"}"#);
}

#[test]
fn literal_tuple_list() {
    let series = normalize(
        SourceFormat::LiteralTupleListText,
        "[('Jan 05, 2016', '1.2345'), ('Jan 6, 2016', '1.2400')]",
    );
    assert_eq!(
        to_json(&series),
        r#"{"Jan 5, 2016":"1.2345","Jan 6, 2016":"1.2400"}"#
    );
}

// ── Properties on fixed fixtures ─────────────────────────────────────

#[test]
fn last_write_wins_across_positions() {
    let series = normalize(
        SourceFormat::CommaSeparatedWithHeader,
        "d,p\n2016-01-05,1\n2016-01-06,2\n2016-01-05,3\n",
    );
    let d1 = CanonicalDate::from_ymd(2016, 1, 5).unwrap();
    assert_eq!(series.get(&d1).unwrap().as_str(), "3");
}

#[test]
fn date_correction_applies_at_any_position() {
    let dropped = CanonicalDate::from_ymd(2016, 1, 6).unwrap();
    let payloads = [
        "d,p\n2016-01-06,9\n2016-01-05,1\n2016-01-07,2\n",
        "d,p\n2016-01-05,1\n2016-01-06,9\n2016-01-07,2\n",
        "d,p\n2016-01-05,1\n2016-01-07,2\n2016-01-06,9\n",
    ];
    for payload in payloads {
        let outcome = SeriesBuilder::for_source(SourceFormat::CommaSeparatedWithHeader)
            .with_corrections([Correction::Date(dropped)].into_iter().collect())
            .build_payload(SourceFormat::CommaSeparatedWithHeader, payload)
            .unwrap();
        assert!(!outcome.series.contains(&dropped), "{payload:?}");
        assert_eq!(outcome.series.len(), 2);
    }
}

fn fixture(format: SourceFormat) -> &'static str {
    match format {
        SourceFormat::LabeledJsonBlob => {
            r#"{"thlabels": ["1<br>Jan 5, 2016", "2<br>Jan 6, 2016"]}"#
        }
        SourceFormat::TabSeparatedReverseChron => "2016-01-06\t1P\n2016-01-05\t2P\n",
        SourceFormat::TabSeparatedWithHeader => "date\tnavps\n2016-01-05\t1.5\n2016-01-06\t1.6\n",
        SourceFormat::TabSeparated => "01/04/2016\t7000.1\n01/05/2016\t7100\n",
        SourceFormat::EmbeddedJsonArrays => {
            r#"{"category": ["2016-01-05", "2016-01-06"], "values": [1, 2.5]}"#
        }
        SourceFormat::LiteralTupleListText => "[('Jan 5, 2016', '1.5'), ('Jan 6, 2016', '1.6')]",
        SourceFormat::CommaSeparatedWithHeader => "d,p\n2015-01-02,100\n2015-01-05,101\n",
        SourceFormat::BracketedPairListEpoch => "[[1420156800000,98.5],[1420243200000,99]]",
    }
}

#[test]
fn decoders_are_deterministic() {
    for format in SourceFormat::ALL {
        let payload = fixture(format);
        let first = format.decode(payload).unwrap();
        assert_eq!(first.len(), 2, "{format}");
        assert_eq!(first, format.decode(payload).unwrap(), "{format}");

        let series = normalize(format, payload);
        assert_eq!(series.len(), 2, "{format}");
        assert_eq!(series, normalize(format, payload), "{format}");
    }
}

#[test]
fn instrument_overrides_source_defaults() {
    // Same shape as the reverse-chron source, but a literal currency marker.
    let format = RecordFormat::new(DateFormat::IsoYmd)
        .with_unit_suffix(UnitSuffix::Literal(" PHP".into()));
    let outcome = SeriesBuilder::new(format)
        .build_payload(SourceFormat::TabSeparatedReverseChron, "2016-01-05\t101.25 PHP\n")
        .unwrap();
    assert_eq!(to_json(&outcome.series), r#"{"Jan 5, 2016":"101.25"}"#);
}

#[test]
fn rejections_are_counted_not_fatal() {
    let outcome = SeriesBuilder::for_source(SourceFormat::CommaSeparatedWithHeader)
        .build_payload(
            SourceFormat::CommaSeparatedWithHeader,
            "d,p\n2016-13-40,1\nnot-a-date,2\n2016-01-05,-1.0\n2016-01-06,1.0\n",
        )
        .unwrap();
    assert_eq!(outcome.series.len(), 1);
    assert_eq!(outcome.report.total, 4);
    assert_eq!(outcome.report.rejected, 3);
    assert!(outcome.report.exceeds(0.05));
}
