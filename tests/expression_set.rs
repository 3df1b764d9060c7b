use exprset::{
    combine, Error, ExpressionSet, MetadataFilter, MetadataRecord, MetadataValue, Selection,
};
use ndarray::{array, Array2};

fn three_by_two() -> ExpressionSet {
    ExpressionSet::builder_from_numeric(
        array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]],
        ["S1", "S2"],
        ["A", "B", "C"],
    )
    .build()
    .unwrap()
}

fn wide(prefix: &str, samples: usize) -> ExpressionSet {
    let values = Array2::from_shape_fn((3, samples), |(i, j)| Some((i * 100 + j) as f64));
    let names: Vec<String> = (1..=samples).map(|j| format!("{prefix}{j}")).collect();
    ExpressionSet::builder(values, names, ["A", "B", "C"])
        .sample_column("batch", (0..samples).map(|_| prefix.to_string()))
        .build()
        .unwrap()
}

#[test]
fn get_and_subset_small_matrix() {
    let set = three_by_two();
    assert_eq!(set.get("B", "S2").unwrap(), Some(4.0));

    let s1 = set.subset_samples(["S1"]).unwrap();
    assert_eq!(s1.size(), (3, 1));
    assert_eq!(s1.values(), &array![[Some(1.0)], [Some(3.0)], [Some(5.0)]]);
}

#[test]
fn constructor_checks_every_dimension() {
    for samples in [0usize, 1, 3, 4] {
        let names: Vec<String> = (0..samples).map(|j| format!("S{j}")).collect();
        let result = ExpressionSet::new(Array2::from_elem((3, 2), None), names, ["A", "B", "C"]);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })), "{samples} sample names");
    }
    for features in [0usize, 2, 4] {
        let names: Vec<String> = (0..features).map(|i| format!("F{i}")).collect();
        let result = ExpressionSet::new(Array2::from_elem((3, 2), None), ["S1", "S2"], names);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })), "{features} feature names");
    }
}

#[test]
fn names_match_size() {
    for set in [three_by_two(), wide("x", 7), wide("y", 0)] {
        assert_eq!(set.feature_names().len(), set.size().0);
        assert_eq!(set.sample_names().len(), set.size().1);
    }
}

#[test]
fn subset_identity() {
    let set = wide("S", 5);
    assert_eq!(set.subset(None, None).unwrap(), set);
}

#[test]
fn subset_by_name_agrees_with_position() {
    let set = wide("S", 5);
    let by_name = set.subset_samples(["S2", "S4"]).unwrap();
    let positions = ["S2", "S4"].map(|n| set.sample_position(n).unwrap());
    let by_position = set.subset(Some(Selection::from(positions)), None).unwrap();
    assert_eq!(by_name.values(), by_position.values());
    assert_eq!(by_name, by_position);
}

#[test]
fn subset_failures() {
    let set = wide("S", 5);
    assert!(matches!(set.subset_samples(["S9"]), Err(Error::NameNotFound { .. })));
    assert!(matches!(set.subset_samples([0usize]), Err(Error::IndexOutOfBounds { .. })));
    assert!(matches!(set.subset_samples([6usize]), Err(Error::IndexOutOfBounds { .. })));
    assert!(matches!(set.subset_features(["Z"]), Err(Error::NameNotFound { .. })));
}

#[test]
fn combine_shapes_add_up() {
    let (a, b, c) = (wide("a", 2), wide("b", 3), wide("c", 1));
    let combined = combine(&[a.clone(), b.clone(), c.clone()]).unwrap();
    assert_eq!(
        combined.num_samples(),
        a.num_samples() + b.num_samples() + c.num_samples()
    );
    assert_eq!(combined.feature_names(), a.feature_names());
    assert_eq!(combined.sample_metadata_column("batch").unwrap().len(), 6);
    assert_eq!(combined.get("C", "b3").unwrap(), Some(202.0));
}

#[test]
fn combine_rejects_other_features() {
    let a = wide("a", 2);
    let b = three_by_two().subset_features(["A", "C", "B"]).unwrap();
    assert!(matches!(combine(&[a, b]), Err(Error::IncompatibleFeatures { .. })));
}

#[test]
fn combine_single_and_empty() {
    let a = wide("a", 2);
    assert_eq!(ExpressionSet::combine(std::slice::from_ref(&a)).unwrap(), a);
    assert!(matches!(combine(&[]), Err(Error::EmptyInput)));
}

#[test]
fn merge_and_combine_treat_experiment_data_differently() {
    let x = MetadataRecord::builder().name("X").title("T1").samples(["x1"]).build();
    let y = MetadataRecord::builder().name("Y").title("T2").samples(["y1"]).build();

    let merged = MetadataRecord::merge(&x, &y);
    assert_eq!(merged.name(), "XY");
    assert_eq!(merged.title(), "T1T2");
    assert_eq!(merged.samples(), ["x1", "y1"]);

    let a = ExpressionSet::builder(array![[Some(1.0)]], ["a"], ["g"])
        .experiment_data(x)
        .build()
        .unwrap();
    let b = ExpressionSet::builder(array![[Some(2.0)]], ["b"], ["g"])
        .experiment_data(y)
        .build()
        .unwrap();
    let combined = combine(&[a, b]).unwrap();
    let exp = combined.experiment_data().unwrap();
    assert_eq!(exp.name(), "X");
    assert_eq!(exp.title(), "Combined: T1");
    assert_eq!(exp.samples(), ["x1", "y1"]);
}

#[test]
fn filter_then_combine() {
    let combined = combine(&[wide("a", 2), wide("b", 2)]).unwrap();
    let mut filter = MetadataFilter::new();
    filter.insert("batch".into(), [MetadataValue::from("b")].into_iter().collect());
    let only_b = combined.filter_samples(&filter).unwrap();
    assert_eq!(only_b.sample_names(), ["b1", "b2"]);
}
