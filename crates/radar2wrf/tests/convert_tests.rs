//! End-to-end conversions of synthetic CAPPI directories.

use std::io::Read;

use futures::StreamExt;
use radar2wrf::{
    assemble, convert, AbsentBandPolicy, BandIndex, ConvertError, Converter, ConverterConfig,
    ErrorKind, ReportError,
};
use test_utils::{
    create_indexed_grid, create_sparse_echo_grid, CappiFile, CappiFixture, CoordinateStyle,
};

const KEY: &str = "2020072000";

const VALID_2000: &str =
    "   2000.0 -888888.000 -88 -888888.000       7.000   0       5.000";

fn bands(list: &[u8]) -> Vec<BandIndex> {
    list.iter().map(|n| BandIndex::new(*n).unwrap()).collect()
}

fn converter(list: &[u8]) -> Converter {
    Converter::new(ConverterConfig {
        bands: bands(list),
        ..Default::default()
    })
    .unwrap()
}

fn read_all(converter: &Converter, fixture: &CappiFixture) -> String {
    let mut stream = converter.convert(fixture.path(), fixture.key()).unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).unwrap();
    out
}

fn header_count(report: &str) -> usize {
    let radar = report.lines().nth(3).unwrap();
    radar.split_whitespace().nth(5).unwrap().parse().unwrap()
}

fn point_headers(report: &str) -> Vec<&str> {
    report
        .lines()
        .filter(|l| l.starts_with("FM-128 RADAR"))
        .collect()
}

// =============================================================================
// Report Layout Tests
// =============================================================================

#[test]
fn test_single_band_single_reading() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(
        2,
        &CappiFile::new(1, 2)
            .lat(vec![10.0, 20.0])
            .lon(vec![5.0])
            .values(vec![-1.0, 7.0]),
    );

    let report = read_all(&converter(&[2]), &fixture);
    assert_eq!(
        report,
        format!(
            "TOTAL NUMBER =  1\n\
             #-----------------#\n\
             \n\
             RADAR                 5.000    20.000     100.0  2020-07-20_00:00:00        1     3\n\
             #-------------------------------------------------------------------------------#\n\
             \n\
             FM-128 RADAR   2020-07-20_00:00:00        20.000         5.000     100.0       3\n\
             {}\n",
            VALID_2000
        )
    );
}

#[test]
fn test_default_bands_fill_absent_levels() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(
        2,
        &CappiFile::new(1, 2)
            .lat(vec![10.0, 20.0])
            .lon(vec![5.0])
            .values(vec![-1.0, 7.0]),
    );

    let mut stream = convert(fixture.path(), KEY).unwrap();
    let mut report = String::new();
    stream.read_to_string(&mut report).unwrap();

    let lines: Vec<&str> = report.lines().collect();
    assert!(lines[3].ends_with("     4"));
    assert!(lines[6].ends_with("       4"));
    assert_eq!(lines[7], VALID_2000);
    for (line, height) in lines[8..].iter().zip([3000, 4000, 5000, 6000, 7000, 8000]) {
        assert_eq!(
            *line,
            format!(
                "{:9.1} -888888.000 -88 -888888.000 -888888.000 -88 -888888.000",
                height as f64
            )
        );
    }
    assert_eq!(lines.len(), 14);
}

// =============================================================================
// Inclusion Rule and Ordering Tests
// =============================================================================

#[test]
fn test_header_count_matches_body() {
    let fixture = CappiFixture::new(KEY);
    let (width, height) = (7, 5);
    let b2 = create_sparse_echo_grid(width, height, 3);
    let b3 = create_sparse_echo_grid(width, height, 4);
    let b5 = create_sparse_echo_grid(width, height, 5);
    fixture.write_band(2, &CappiFile::new(width, height).values(b2.clone()));
    fixture.write_band(3, &CappiFile::new(width, height).values(b3.clone()));
    fixture.write_band(5, &CappiFile::new(width, height).values(b5.clone()));

    let report = read_all(&converter(&[2, 3, 5]), &fixture);

    let expected = (0..width * height)
        .filter(|&i| b2[i] >= 0.0 || b3[i] >= 0.0 || b5[i] >= 0.0)
        .count();

    assert_eq!(header_count(&report), expected);
    assert_eq!(point_headers(&report).len(), expected);
    // header block + one point header and three levels per point
    assert_eq!(report.lines().count(), 6 + expected * 4);
}

#[test]
fn test_body_is_column_major_rows_descending() {
    let fixture = CappiFixture::new(KEY);
    let (width, height) = (3, 4);
    fixture.write_band(
        2,
        &CappiFile::new(width, height)
            .lat(vec![40.0, 41.0, 42.0, 43.0])
            .lon(vec![5.0, 6.0, 7.0])
            .values(create_indexed_grid(width, height)),
    );

    let report = read_all(&converter(&[2]), &fixture);
    let lines: Vec<&str> = report.lines().collect();

    let mut visited = Vec::new();
    for pair in lines[6..].chunks(2) {
        let value: f64 = pair[1].split_whitespace().nth(4).unwrap().parse().unwrap();
        let value = value as usize;
        visited.push((value / 1000, value % 1000));
    }

    let expected: Vec<(usize, usize)> = (0..width)
        .flat_map(|x| (0..height).rev().map(move |y| (x, y)))
        .collect();
    assert_eq!(visited, expected);

    // First point is x=0, y=height-1: lon 5, lat 43
    assert_eq!(
        lines[6],
        "FM-128 RADAR   2020-07-20_00:00:00        43.000         5.000     100.0       3"
    );
}

// =============================================================================
// Absent Band Tests
// =============================================================================

#[test]
fn test_deleted_band_writes_sentinels() {
    let fixture = CappiFixture::new(KEY);
    for band in [2, 3, 5] {
        fixture.write_band(band, &CappiFile::new(2, 1).values(vec![7.0, -1.0]));
    }
    fixture.remove_band(3);

    let report = read_all(&converter(&[2, 3, 5]), &fixture);
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(header_count(&report), 1);
    assert_eq!(lines[7], VALID_2000);
    assert_eq!(
        lines[8],
        "   3000.0 -888888.000 -88 -888888.000 -888888.000 -88 -888888.000"
    );
    assert!(lines[9].starts_with("   5000.0"));
    assert!(lines[9].ends_with("       7.000   0       5.000"));
}

#[test]
fn test_small_negative_reading_is_sentinel() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(2, &CappiFile::new(1, 1).values(vec![7.0]));
    fixture.write_band(3, &CappiFile::new(1, 1).values(vec![-0.0001]));
    fixture.write_band(5, &CappiFile::new(1, 1).values(vec![0.0]));

    let report = read_all(&converter(&[2, 3, 5]), &fixture);
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 10);
    assert_eq!(lines[7], VALID_2000);
    assert_eq!(
        lines[8],
        "   3000.0 -888888.000 -88 -888888.000 -888888.000 -88 -888888.000"
    );
    assert_eq!(
        lines[9],
        "   5000.0 -888888.000 -88 -888888.000       0.000   0       5.000"
    );
}

#[test]
fn test_small_negative_alone_is_not_an_observation() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(2, &CappiFile::new(2, 1).values(vec![-0.0001, 7.0]));

    let report = read_all(&converter(&[2]), &fixture);
    assert_eq!(header_count(&report), 1);
    assert_eq!(
        point_headers(&report),
        vec!["FM-128 RADAR   2020-07-20_00:00:00        40.000         6.000     100.0       3"]
    );
}

#[test]
fn test_omit_policy_drops_absent_levels() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(2, &CappiFile::new(1, 1).values(vec![7.0]));

    let converter = Converter::new(ConverterConfig {
        bands: bands(&[2, 3, 5]),
        absent_bands: AbsentBandPolicy::Omit,
        ..Default::default()
    })
    .unwrap();
    let report = read_all(&converter, &fixture);
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 8);
    // Row code follows the configured band set, not the lines written
    assert!(lines[6].ends_with("     100.0       3"));
    assert_eq!(lines[7], VALID_2000);
}

#[test]
fn test_no_bands_present() {
    let fixture = CappiFixture::new(KEY);
    let report = read_all(&converter(&[2, 3, 5]), &fixture);
    assert_eq!(report.lines().count(), 6);
    assert!(report.contains("RADAR                 1.000     1.000"));
    assert_eq!(header_count(&report), 0);
}

#[test]
fn test_all_bands_present() {
    let fixture = CappiFixture::new(KEY);
    for band in 2..=8u8 {
        fixture.write_band(band, &CappiFile::new(2, 2).values(vec![f32::from(band); 4]));
    }

    let mut stream = convert(fixture.path(), KEY).unwrap();
    let mut report = String::new();
    stream.read_to_string(&mut report).unwrap();

    assert_eq!(header_count(&report), 4);
    assert_eq!(report.lines().count(), 6 + 4 * 8);
    assert!(!report.contains("-888888.000 -88 -888888.000\n"));
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_deleted_directory_is_io_error() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(2, &CappiFile::new(1, 1));
    let path = fixture.delete();

    let err = convert(&path, KEY).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(matches!(err, ConvertError::Io { .. }));
}

#[test]
fn test_bad_key_fails_before_reading() {
    let fixture = CappiFixture::new(KEY);
    let path = fixture.delete();

    // The directory is gone too, but the key is checked first
    let err = convert(&path, "abc").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTimestamp);

    let err = convert(&path, "2020133100").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTimestamp);
}

#[test]
fn test_requested_instant_on_radar_line() {
    let fixture = CappiFixture::new("202007201230");
    fixture.write_band(2, &CappiFile::new(1, 1).values(vec![7.0]));

    let report = read_all(&converter(&[2]), &fixture);
    let lines: Vec<&str> = report.lines().collect();
    assert!(lines[3].contains("2020-07-20_12:30:00"));
    // Point lines carry the file's own instant
    assert!(lines[6].contains("2020-07-20_00:00:00"));
}

// =============================================================================
// Coordinate Convention Tests
// =============================================================================

#[test]
fn test_per_point_coordinates() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(
        2,
        &CappiFile::new(2, 2)
            .lat(vec![36.0, 37.0])
            .lon(vec![-6.0, -5.0])
            .values(vec![-1.0, -1.0, 7.0, -1.0])
            .style(CoordinateStyle::PerPoint),
    );

    let report = read_all(&converter(&[2]), &fixture);
    assert_eq!(
        point_headers(&report),
        vec!["FM-128 RADAR   2020-07-20_00:00:00        37.000        -6.000     100.0       3"]
    );
    assert!(report.contains("RADAR                -5.000    37.000"));
}

#[test]
fn test_coordinates_from_later_band() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(2, &CappiFile::new(1, 1).values(vec![7.0]).without_coordinates());
    fixture.write_band(
        3,
        &CappiFile::new(1, 1).lat(vec![44.0]).lon(vec![8.0]).values(vec![-1.0]),
    );

    let grid = assemble(fixture.path(), KEY, &bands(&[2, 3])).unwrap();
    assert_eq!(grid.lat(), &[44.0]);
    assert_eq!(grid.lon(), &[8.0]);
    assert_eq!(grid.observation_count(), 1);
}

#[test]
fn test_coordinates_nowhere() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(2, &CappiFile::new(1, 1).values(vec![7.0]).without_coordinates());

    let err = assemble(fixture.path(), KEY, &bands(&[2])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_missing_value_variable_is_absent() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(2, &CappiFile::new(1, 1).values(vec![7.0]));
    fixture.write_band(3, &CappiFile::new(1, 1).without_values());

    let grid = assemble(fixture.path(), KEY, &bands(&[2, 3])).unwrap();
    assert!(grid.band(BandIndex::new(2).unwrap()).unwrap().is_present());
    assert!(!grid.band(BandIndex::new(3).unwrap()).unwrap().is_present());
}

#[test]
fn test_band_shape_mismatch() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(2, &CappiFile::new(2, 2).values(vec![1.0; 4]));
    fixture.write_band(3, &CappiFile::new(3, 1).values(vec![1.0; 3]));

    let err = assemble(fixture.path(), KEY, &bands(&[2, 3])).unwrap_err();
    assert!(matches!(err, ConvertError::ShapeMismatch(_)));
}

#[test]
fn test_corrupt_band_is_fatal() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(2, &CappiFile::new(1, 1).values(vec![7.0]));
    std::fs::write(fixture.band_path(3), b"not a netcdf file").unwrap();

    let err = assemble(fixture.path(), KEY, &bands(&[2, 3])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

// =============================================================================
// Streaming Tests
// =============================================================================

#[test]
fn test_overflowing_reading_ends_stream_with_error() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(2, &CappiFile::new(2, 1).values(vec![7.0, 1.0e9]));

    let mut stream = converter(&[2]).convert(fixture.path(), KEY).unwrap();
    let mut out = Vec::new();
    let err = stream.read_to_end(&mut out).unwrap_err();
    let inner = err.into_inner().unwrap().downcast::<ReportError>().unwrap();
    assert!(matches!(*inner, ReportError::FieldOverflow { field: "reflectivity", .. }));
}

#[test]
fn test_large_readings_within_width() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(2, &CappiFile::new(1, 1).values(vec![999_999.0]));

    let report = read_all(&converter(&[2]), &fixture);
    assert!(report.ends_with(
        "   2000.0 -888888.000 -88 -888888.000  999999.000   0       5.000\n"
    ));
}

#[test]
fn test_small_chunks_match_single_chunk() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(2, &CappiFile::new(6, 6).values(create_sparse_echo_grid(6, 6, 2)));

    let whole = read_all(&converter(&[2]), &fixture);
    let chunked = Converter::new(ConverterConfig {
        bands: bands(&[2]),
        chunk_size: 7,
        channel_capacity: 1,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(read_all(&chunked, &fixture), whole);
}

#[test]
fn test_dropping_stream_early() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(2, &CappiFile::new(20, 20).values(vec![5.0; 400]));

    let converter = Converter::new(ConverterConfig {
        bands: bands(&[2]),
        chunk_size: 16,
        channel_capacity: 1,
        ..Default::default()
    })
    .unwrap();
    let mut stream = converter.convert(fixture.path(), KEY).unwrap();
    let mut first = [0u8; 8];
    stream.read_exact(&mut first).unwrap();
    assert_eq!(&first, b"TOTAL NU");
    drop(stream);
}

#[tokio::test]
async fn test_async_consumption() {
    let fixture = CappiFixture::new(KEY);
    fixture.write_band(
        2,
        &CappiFile::new(1, 2)
            .lat(vec![10.0, 20.0])
            .lon(vec![5.0])
            .values(vec![-1.0, 7.0]),
    );

    let stream = converter(&[2]).convert(fixture.path(), KEY).unwrap();
    let chunks: Vec<_> = stream.collect().await;
    let mut report = Vec::new();
    for chunk in chunks {
        report.extend_from_slice(&chunk.unwrap());
    }
    let report = String::from_utf8(report).unwrap();
    assert!(report.ends_with(&format!("{}\n", VALID_2000)));
}
