use tracking_series::series::{align_events, mask};
use tracking_series::{Column, Error, TimeSeriesStore};

fn store(dates: Vec<i64>, line: Vec<Option<f64>>, markers: Vec<bool>) -> TimeSeriesStore {
    TimeSeriesStore::from_columns(
        dates,
        vec![
            ("line".to_string(), Column::Continuous(line)),
            ("event".to_string(), Column::Event(markers)),
        ],
    )
    .expect("store")
}

#[test]
fn interpolation_matches_linear_formula() {
    // line readings every 60s, events at odd offsets in between
    let mut dates = Vec::new();
    let mut line = Vec::new();
    let mut markers = Vec::new();
    for i in 0..50i64 {
        dates.push(i * 60);
        line.push(Some((i * i) as f64 * 0.5));
        markers.push(false);
        dates.push(i * 60 + 17);
        line.push(None);
        markers.push(i < 49);
    }
    let store = store(dates, line, markers);
    let aligned = store.align_columns("line", "event").expect("align");
    assert_eq!(aligned.len(), 49);

    for (date, value) in aligned.iter() {
        let i = date / 60;
        let (t0, t1) = (i * 60, (i + 1) * 60);
        let (v0, v1) = ((i * i) as f64 * 0.5, ((i + 1) * (i + 1)) as f64 * 0.5);
        let expected = v0 + (v1 - v0) * (date - t0) as f64 / (t1 - t0) as f64;
        assert!((value - expected).abs() < 1e-9, "t={date}: {value} vs {expected}");
    }
}

#[test]
fn exact_dates_return_stored_values() {
    let dates = vec![0, 100, 100, 250];
    let line = vec![Some(1.0), None, Some(1.0 / 3.0), Some(9.0)];
    // the event row at t=100 has no reading, but another row at t=100 does
    let markers = vec![false, true, false, false];
    let store = store(dates, line, markers);
    let aligned = store.align_columns("line", "event").expect("align");
    assert_eq!(aligned.dates, vec![100]);
    assert_eq!(aligned.values[0].to_bits(), (1.0f64 / 3.0).to_bits());
}

#[test]
fn events_outside_the_line_clamp_to_its_ends() {
    let dates = vec![-50, 0, 10, 20, 99];
    let line = vec![None, Some(5.0), Some(6.0), Some(8.0), None];
    let markers = vec![true, false, false, false, true];
    let store = store(dates, line, markers);
    let aligned = store.align_columns("line", "event").expect("align");
    assert_eq!(aligned.dates, vec![-50, 99]);
    assert_eq!(aligned.values, vec![5.0, 8.0]);
}

#[test]
fn unsorted_rows_keep_row_order_in_output() {
    let dates = vec![30, 0, 15, 20];
    let line = vec![Some(3.0), Some(0.0), None, None];
    let markers = vec![false, false, true, true];
    let aligned = align_events(&dates, &line, &markers).expect("align");
    assert_eq!(aligned.dates, vec![15, 20]);
    assert_eq!(aligned.values, vec![1.5, 2.0]);
}

#[test]
fn no_events_and_all_missing_cases() {
    let store = store(vec![0, 1, 2], vec![None, None, None], vec![false, false, false]);
    let aligned = store.align_columns("line", "event").expect("align");
    assert!(aligned.is_empty());

    let store = store_with_event(vec![None, None, None], vec![false, true, false]);
    let err = store.align_columns("line", "event").unwrap_err();
    assert!(matches!(err, Error::InsufficientData));
}

#[test]
fn remasking_is_a_no_op() {
    let dates = [5, 3, 8, 1, 9];
    let values = [Some(2.0), None, Some(f64::NAN), Some(4.0), Some(-7.5)];
    let once = mask(&dates, &values).expect("mask");
    let values: Vec<Option<f64>> = once.values.iter().map(|&v| Some(v)).collect();
    let twice = mask(&once.dates, &values).expect("mask");
    assert_eq!(once, twice);
    assert_eq!(twice.dates, vec![5, 1, 9]);
}

fn store_with_event(line: Vec<Option<f64>>, markers: Vec<bool>) -> TimeSeriesStore {
    let dates = (0..line.len() as i64).collect();
    store(dates, line, markers)
}

#[test]
fn extreme_dates_interpolate_without_overflow() {
    let store = store(
        vec![i64::MIN, 0, i64::MAX],
        vec![Some(1.0), None, Some(2.0)],
        vec![false, true, false],
    );
    let aligned = store.align_columns("line", "event").expect("align");
    assert_eq!(aligned.dates, vec![0]);
    assert!(aligned.values[0].is_finite());
    assert!((aligned.values[0] - 1.5).abs() < 1e-9);
}
