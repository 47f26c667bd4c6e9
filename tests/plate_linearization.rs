use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use scl_linearizer::case::read_case_parameters;
use scl_linearizer::prelude::*;
use scl_linearizer::results::write_summary_csv;

const GRID: [(f64, f64); 4] = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)];

fn values(stress: [f64; 6]) -> NodalValues {
    NodalValues {
        coords: None,
        stress,
        elastic_strain: StrainRecord {
            components: [1e-3, -5e-4, -5e-4, 0.0, 0.0, 0.0],
            eqv: 1e-3,
        },
        plastic_strain: None,
    }
}

/// Surfaces at z = 0 (ids 1..=4) and z = 10 (ids 11..=14) written as
/// node files, plus a results directory
fn write_plate(dir: &Path) {
    let mut first = String::new();
    let mut second = String::new();
    for (i, (x, y)) in GRID.iter().enumerate() {
        first.push_str(&format!("{},{x},{y},0.0\n", i + 1));
        second.push_str(&format!("{},{x},{y},10.0\n", i + 11));
    }
    fs::write(dir.join("first.csv"), &first).unwrap();
    fs::write(dir.join("second.csv"), &second).unwrap();
    fs::write(dir.join("all.csv"), format!("node,x,y,z\n{first}\n{second}")).unwrap();
    fs::create_dir_all(dir.join("results")).unwrap();
}

fn write_case(dir: &Path, name: &str, stress_at: impl Fn(u32) -> [f64; 6]) {
    let mut result = NodalResult::new();
    for id in [1, 2, 3, 4, 11, 12, 13, 14] {
        result.insert(id, values(stress_at(id)));
    }
    fs::write(
        dir.join("results").join(format!("{name}.json")),
        serde_json::to_string(&result).unwrap(),
    )
    .unwrap();
}

fn geometry(dir: &Path) -> Geometry {
    Geometry::from_files(dir.join("first.csv"), dir.join("second.csv"), dir.join("all.csv"), None).unwrap()
}

#[test]
fn uniform_stress_has_no_bending() {
    let dir = tempfile::tempdir().unwrap();
    write_plate(dir.path());
    write_case(dir.path(), "uniform", |_| [100.0, 50.0, 50.0, 0.0, 0.0, 0.0]);

    let linearizer = Linearizer::new(geometry(dir.path()), LinearizationOptions::default().with_npoints(5)).unwrap();
    let provider = JsonFieldProvider::new(dir.path().join("results"));
    let record = linearizer
        .evaluate("uniform", &CaseParameters::new(), &provider)
        .unwrap();

    assert_eq!(record.stress.n_lines(), 4);
    for l in 0..4 {
        let expected = [100.0, 50.0, 50.0, 0.0, 0.0, 0.0];
        for c in 0..6 {
            assert_relative_eq!(record.stress.membrane[l][c], expected[c], epsilon = 1e-10);
            assert_relative_eq!(record.stress.bending[l][c], 0.0, epsilon = 1e-10);
        }
        assert_relative_eq!(record.stress.location[l][2], 5.0, epsilon = 1e-12);
        let (a, b) = record.stress.nodes[l].unwrap();
        assert_eq!(b, a + 10);
    }
    assert_relative_eq!(record.summary.stress.membrane, 50.0, epsilon = 1e-10);
}

#[test]
fn decomposition_is_exact_on_the_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    write_plate(dir.path());
    write_case(dir.path(), "gradient", |id| {
        let sxx = if id < 10 { 200.0 } else { 100.0 };
        [sxx, 20.0, -10.0, 15.0, 0.0, 5.0]
    });

    let linearizer = Linearizer::new(geometry(dir.path()), LinearizationOptions::default().with_npoints(7)).unwrap();
    let provider = JsonFieldProvider::new(dir.path().join("results"));
    let record = linearizer
        .evaluate("gradient", &CaseParameters::new(), &provider)
        .unwrap();

    for l in 0..record.stress.n_lines() {
        let [top, bottom] = record.stress.linearized(l);
        let [peak_top, peak_bottom] = record.stress.peak[l];
        assert_relative_eq!(top[0] + peak_top[0], 200.0, epsilon = 1e-9);
        assert_relative_eq!(bottom[0] + peak_bottom[0], 100.0, epsilon = 1e-9);
        assert_relative_eq!(top[3] + peak_top[3], 15.0, epsilon = 1e-9);
        assert!(record.stress.bending[l][0] > 0.0);
    }
}

#[test]
fn batch_writes_summary_and_skips_bad_cases() {
    let dir = tempfile::tempdir().unwrap();
    write_plate(dir.path());
    write_case(dir.path(), "e200e3", |_| [100.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    write_case(dir.path(), "midside_only", |id| {
        if id < 10 {
            [100.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        } else {
            [f64::NAN; 6]
        }
    });
    fs::write(
        dir.path().join("options.json"),
        r#"{"npoints": 5, "use_cache": false, "node_subset": [1, 2, 3, 4, 11, 12, 13, 14]}"#,
    )
    .unwrap();

    let options = LinearizationOptions::from_json_file(dir.path().join("options.json")).unwrap();
    let linearizer = Linearizer::new(geometry(dir.path()), options).unwrap();
    let provider = JsonFieldProvider::new(dir.path().join("results"));
    let cases = vec![
        CaseSpec::new("e200e3", CaseParameters::new().with("e", 200e3)),
        CaseSpec::new("midside_only", CaseParameters::new().with("e", 100e3)),
    ];
    let report = CaseBatch::new(&linearizer, &provider).run(&cases).unwrap();
    assert_eq!(report.summaries.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].case, "midside_only");

    let csv_path = dir.path().join("summary.csv");
    write_summary_csv(&csv_path, &report.summaries).unwrap();
    let csv = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "case,e,membrane_stress,bending_stress,linearized_stress,membrane_strain,\
         bending_strain,linearized_strain,max_eqv_stress,max_eqv_strain"
    );
    let row: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(row[0], "e200e3");
    assert_eq!(row[1], "200000");
    assert_relative_eq!(row[2].parse::<f64>().unwrap(), 100.0, epsilon = 1e-9);
    assert_relative_eq!(row[8].parse::<f64>().unwrap(), 100.0, epsilon = 1e-9);
}

#[test]
fn parameters_file_adds_summary_columns() {
    let dir = tempfile::tempdir().unwrap();
    write_plate(dir.path());
    write_case(dir.path(), "w1", |_| [100.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    write_case(dir.path(), "w2", |_| [80.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    fs::write(
        dir.path().join("parameters.json"),
        r#"{"w1": {"values": [["e", 200000.0], ["y", 250.0]]}, "w2": {"values": [["e", 190000.0], ["y", 300.0]]}}"#,
    )
    .unwrap();

    let parameters = read_case_parameters(dir.path().join("parameters.json")).unwrap();
    let cases: Vec<CaseSpec> = ["w1", "w2"]
        .iter()
        .map(|&name| CaseSpec::new(name, parameters[name].clone()))
        .collect();
    let linearizer = Linearizer::new(
        geometry(dir.path()),
        LinearizationOptions::default().with_npoints(3).without_cache(),
    )
    .unwrap();
    let provider = JsonFieldProvider::new(dir.path().join("results"));
    let report = CaseBatch::new(&linearizer, &provider).run(&cases).unwrap();

    let csv_path = dir.path().join("summary.csv");
    write_summary_csv(&csv_path, &report.summaries).unwrap();
    let csv = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert!(lines[0].starts_with("case,e,y,membrane_stress,"));
    assert!(lines[1].starts_with("w1,200000,250,"));
    assert!(lines[2].starts_with("w2,190000,300,"));
}

#[test]
fn cached_result_survives_a_new_linearizer() {
    let dir = tempfile::tempdir().unwrap();
    write_plate(dir.path());
    write_case(dir.path(), "w1", |_| [120.0, 0.0, 0.0, 30.0, 0.0, 0.0]);
    let cache_dir = dir.path().join("cache");
    let provider = JsonFieldProvider::new(dir.path().join("results"));
    let params = CaseParameters::new().with("e", 200e3);
    let options = LinearizationOptions::default().with_npoints(5).with_cache_dir(&cache_dir);

    let first = Linearizer::new(geometry(dir.path()), options.clone())
        .unwrap()
        .evaluate("w1", &params, &provider)
        .unwrap();
    assert_eq!(fs::read_dir(&cache_dir).unwrap().count(), 1);

    let second = Linearizer::new(geometry(dir.path()), options)
        .unwrap()
        .evaluate("w1", &params, &provider)
        .unwrap();
    assert_eq!(first, second);

    // different options are a different case
    let refined = LinearizationOptions::default().with_npoints(9).with_cache_dir(&cache_dir);
    Linearizer::new(geometry(dir.path()), refined)
        .unwrap()
        .evaluate("w1", &params, &provider)
        .unwrap();
    assert_eq!(fs::read_dir(&cache_dir).unwrap().count(), 2);
}

#[test]
fn graph_pairing_runs_from_a_connectivity_file() {
    // one quad through a wall of thickness 10, surfaces at z = 0 and z = 10
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("first.csv"), "1,0.0,0.0,0.0\n2,1.0,0.0,0.0\n").unwrap();
    fs::write(root.join("second.csv"), "11,0.0,0.0,10.0\n12,1.0,0.0,10.0\n").unwrap();
    fs::write(
        root.join("all.csv"),
        "1,0.0,0.0,0.0\n2,1.0,0.0,0.0\n11,0.0,0.0,10.0\n12,1.0,0.0,10.0\n",
    )
    .unwrap();
    fs::write(root.join("elements.csv"), "1,2,12,11\n").unwrap();

    let mut result = NodalResult::new();
    for id in [1, 2, 11, 12] {
        let sxx = if id < 10 { 200.0 } else { 100.0 };
        result.insert(id, values([sxx, 0.0, 0.0, 0.0, 0.0, 0.0]));
    }
    let provider: std::collections::HashMap<String, NodalResult> =
        [("step".to_string(), result)].into_iter().collect();

    let connectivity = root.join("elements.csv");
    let geometry = Geometry::from_files(
        root.join("first.csv"),
        root.join("second.csv"),
        root.join("all.csv"),
        Some(connectivity.as_path()),
    )
    .unwrap();
    assert!(geometry.mesh.is_some());
    assert!(geometry.checksums.contains_key("connectivity"));

    let linearizer = Linearizer::new(geometry, LinearizationOptions::graph().with_npoints(5).without_cache()).unwrap();
    let record = linearizer.evaluate("step", &CaseParameters::new(), &provider).unwrap();

    assert_eq!(record.stress.nodes, vec![Some((1, 11)), Some((2, 12))]);
    // nearest-node sampling gives 200, 200, 200, 100, 100 through the wall
    for l in 0..2 {
        assert_relative_eq!(record.stress.membrane[l][0], 162.5, epsilon = 1e-10);
        assert_relative_eq!(record.stress.bending[l][0], 75.0, epsilon = 1e-10);
        assert_relative_eq!(record.stress.membrane[l][1], 0.0, epsilon = 1e-12);
    }

    // graph pairing without connectivity is rejected
    let bare = Geometry::from_files(root.join("first.csv"), root.join("second.csv"), root.join("all.csv"), None).unwrap();
    let err = Linearizer::new(bare, LinearizationOptions::graph().with_npoints(5).without_cache())
        .unwrap()
        .evaluate("step", &CaseParameters::new(), &provider)
        .unwrap_err();
    assert!(matches!(err, LinearizationError::InvalidInput(_)));
}

#[test]
fn missing_case_is_reported_by_name() {
    let dir = tempfile::tempdir().unwrap();
    write_plate(dir.path());
    let linearizer = Linearizer::new(geometry(dir.path()), LinearizationOptions::default()).unwrap();
    let provider = JsonFieldProvider::new(dir.path().join("results"));
    let err = linearizer
        .evaluate("nope", &CaseParameters::new(), &provider)
        .unwrap_err();
    assert!(matches!(err, LinearizationError::CaseNotFound(ref name) if name.starts_with("nope")));
}
