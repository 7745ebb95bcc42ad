use std::error::Error as StdError;
use std::io::Cursor;
use crate::config::SweepConfig;
use crate::error::Error;
use crate::report::{csv_header, OutputFormat};
use crate::sweep::{sweep_sizes, RowReport, Sweeper};
use super::{capture_logs, histogram, small_histogram};

const KIB: u64 = 1024;

#[test]
fn sweep_doubles_up_to_the_largest_size() {
    assert_eq!(sweep_sizes(1024 * KIB, 8192 * KIB), vec![1024 * KIB, 2048 * KIB, 4096 * KIB, 8192 * KIB]);
    assert_eq!(sweep_sizes(3, 20), vec![3, 6, 12]);
    assert_eq!(sweep_sizes(5, 5), vec![5]);
}

#[test]
fn empty_sweeps() {
    assert!(sweep_sizes(16, 8).is_empty());
    assert!(sweep_sizes(0, 8).is_empty());
}

#[test]
fn sweep_terminates_near_the_top_of_the_range() {
    let sizes = sweep_sizes(1 << 62, u64::MAX);
    assert_eq!(sizes, vec![1 << 62, 1 << 63]);
}

#[test]
fn default_header_matches_the_report_layout() {
    let config = SweepConfig::default();
    let sizes = sweep_sizes(config.smallest_size, config.largest_size);
    assert_eq!(
        csv_header(config.anchor_size, &sizes),
        "id,random_512,lru_512,total_accesses_512,random_1024,lru_1024,random_2048,lru_2048,\
random_4096,lru_4096,random_8192,lru_8192,total_accesses"
    );
}

fn line_config() -> SweepConfig {
    // One byte lines so sizes are capacities in lines
    SweepConfig {
        line_size: 1,
        lower_levels: vec![],
        anchor_size: 1,
        smallest_size: 2,
        largest_size: 1000,
        ..SweepConfig::default()
    }
}

#[test]
fn row_report_covers_every_size() -> Result<(), Error> {
    let mut sweeper = Sweeper::new(line_config())?;
    let mut histogram = small_histogram();
    let report = sweeper.run_row("small", &mut histogram)?;
    assert_eq!(report.anchor.size, 1);
    assert_eq!(report.points.iter().map(|p| p.size).collect::<Vec<_>>(), vec![2, 4, 8, 16, 32, 64, 128, 256, 512]);
    assert_eq!(report.anchor_total_accesses, 20);
    assert_eq!(report.total_accesses, 20);
    assert!(report.aligned);
    // Everything fits from 2 lines up
    assert!(report.points.iter().all(|p| p.lru_misses == 0));
    assert!(report.points.windows(2).all(|w| w[1].random_miss_ratio <= w[0].random_miss_ratio));
    // The non-destructive sweep leaves the histogram alone
    assert_eq!(histogram.counts(), &[10, 5, 3, 2]);
    Ok(())
}

#[test]
fn overflowing_lower_level_filters_nothing() -> Result<(), Error> {
    let config = SweepConfig {
        lower_levels: vec![0],
        filter_lower_levels: true,
        ..line_config()
    };
    let mut sweeper = Sweeper::new(config)?;
    let mut histogram = small_histogram();
    let report = sweeper.run_row("small", &mut histogram)?;
    assert_eq!(report.anchor_total_accesses, 20);
    assert_eq!(histogram.counts(), &[10, 5, 3, 2]);
    Ok(())
}

#[test]
fn filtered_lower_level_removes_its_hits() -> Result<(), Error> {
    let config = SweepConfig {
        lower_levels: vec![1],
        filter_lower_levels: true,
        ..line_config()
    };
    let mut sweeper = Sweeper::new(config)?;
    let mut histogram = small_histogram();
    let report = sweeper.run_row("small", &mut histogram)?;
    // A one line level already holds the whole working set
    assert_eq!(report.anchor_total_accesses, 0);
    assert_eq!(report.total_accesses, 0);
    assert_eq!(histogram.filter_boundary(), Some(3));
    Ok(())
}

#[test]
fn destructive_sweep_chains_levels() -> Result<(), Error> {
    let config = SweepConfig {
        destructive_sweep: true,
        ..line_config()
    };
    let mut sweeper = Sweeper::new(config)?;
    let mut histogram = histogram(&[0, 4, 8, 16, 32], &[8, 4, 2, 1, 1]);
    let report = sweeper.run_row("wide", &mut histogram)?;
    // Bucket 0 alone overflows one line
    assert_eq!(report.anchor.lru_misses, 16);
    assert_eq!(report.anchor_total_accesses, 16);
    assert_eq!(
        report.points.iter().map(|p| p.lru_misses).collect::<Vec<_>>(),
        vec![16, 2, 2, 2, 0, 0, 0, 0, 0]
    );
    assert_eq!(report.total_accesses, 0);
    Ok(())
}

#[test]
fn invalid_configs_are_rejected() {
    let zero_lines = SweepConfig { line_size: 0, ..SweepConfig::default() };
    assert!(matches!(Sweeper::new(zero_lines), Err(Error::InvalidConfig { field: "line_size", .. })));
    let descending = SweepConfig {
        lower_levels: vec![4096, 1024],
        filter_lower_levels: true,
        ..SweepConfig::default()
    };
    assert!(matches!(Sweeper::new(descending), Err(Error::InvalidConfig { field: "lower_levels", .. })));
    let anchor_above_sweep = SweepConfig {
        destructive_sweep: true,
        anchor_size: 4096 * KIB,
        ..SweepConfig::default()
    };
    assert!(matches!(Sweeper::new(anchor_above_sweep), Err(Error::InvalidConfig { field: "anchor_size", .. })));
}

#[test]
fn partial_json_config_takes_defaults() -> Result<(), Box<dyn StdError>> {
    let config: SweepConfig = serde_json::from_str(r#"{ "line_size": 128, "destructive_sweep": true }"#)?;
    assert_eq!(config.line_size, 128);
    assert!(config.destructive_sweep);
    assert_eq!(config.anchor_size, SweepConfig::default().anchor_size);
    assert_eq!(config.lines(512 * KIB), 4096.0);
    Ok(())
}

#[test]
fn run_writes_csv_report() -> Result<(), Box<dyn StdError>> {
    let input = "id,0,1,2,4\nsmall,10,5,3,2\nshort,4,4\n";
    let mut sweeper = Sweeper::new(line_config())?;
    let mut out = Vec::new();
    let (summary, logs) = capture_logs(|| sweeper.run(Cursor::new(input), OutputFormat::Csv, &mut out));
    let summary = summary?;
    assert_eq!(summary.rows, 2);
    assert_eq!(summary.misaligned_rows, 1);
    assert_eq!(logs.matches("histogram size doesn't match the bucket definition").count(), 1, "{logs}");
    assert!(logs.contains("row=\"short\""), "{logs}");
    let report = String::from_utf8(out)?;
    let lines = report.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("id,random_0,lru_0,total_accesses_0,"));
    assert!(lines[1].starts_with("small,"));
    assert!(lines[1].ends_with(",20"));
    assert!(lines[2].starts_with("short,"));
    assert!(lines[2].ends_with(",8"));
    Ok(())
}

#[test]
fn run_writes_json_report() -> Result<(), Box<dyn StdError>> {
    let input = "id,0,1,2,4\nsmall,10,5,3,2\n";
    let mut sweeper = Sweeper::new(line_config())?;
    let mut out = Vec::new();
    sweeper.run(Cursor::new(input), OutputFormat::Json, &mut out)?;
    let reports: Vec<RowReport> = serde_json::from_slice(&out)?;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].id, "small");
    assert_eq!(reports[0].total_accesses, 20);
    assert_eq!(reports[0].points.len(), 9);
    Ok(())
}

#[test]
fn missing_header_writes_nothing() {
    let mut sweeper = Sweeper::new(SweepConfig::default()).unwrap();
    let mut out = Vec::new();
    assert!(sweeper.run(Cursor::new(""), OutputFormat::Csv, &mut out).is_err());
    assert!(out.is_empty());
}
