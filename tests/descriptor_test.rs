use grads2nc::config::lookup::load_lookup_or_default;
use grads2nc::core::descriptor::{parse_file, Calendar};
use grads2nc::core::metadata::LookupTable;
use grads2nc::domain::model::{AttributeValue, Attributes};
use grads2nc::{ConvertError, Dataset, VariableData};
use std::path::Path;
use tempfile::TempDir;

fn write_pair(dir: &Path, ctl: &str, floats: usize) {
    std::fs::write(dir.join("run.ctl"), ctl).unwrap();
    let bytes: Vec<u8> = (0..floats).flat_map(|i| (i as f32).to_ne_bytes()).collect();
    std::fs::write(dir.join("run.bin"), bytes).unwrap();
}

#[test]
fn test_time_units_and_coordinate_values() {
    let dir = TempDir::new().unwrap();
    write_pair(
        dir.path(),
        "dset ^run.bin\nundef 1e20\nxdef 1 linear 0 1\nydef 1 linear 0 1\nzdef 1 linear 0 1\n\
         tdef 3 linear 00Z01Jan2000 1dy\nvars 1\nv 0 99 v\nendvars\n",
        3,
    );
    let ds = Dataset::open(&dir.path().join("run.ctl"), Attributes::new(), &LookupTable::default())
        .unwrap();

    assert_eq!(ds.time.units(), "days since 2000-01-01 00:00:00");
    match ds.read("time", 0..3).unwrap() {
        VariableData::Axis(values) => assert_eq!(values.to_vec(), vec![0.0, 1.0, 2.0]),
        VariableData::Field(_) => panic!("time resolved as a field"),
    }
    assert_eq!(ds.undef, 1e20);
}

#[test]
fn test_monthly_noleap_descriptor() {
    let dir = TempDir::new().unwrap();
    write_pair(
        dir.path(),
        "DSET ^run.bin\nUNDEF -9.99e8\nOPTIONS 365_day_calendar\nXDEF 3 LINEAR 0 120\n\
         YDEF 1 LINEAR 0 1\nZDEF 0 LINEAR 0 1\nTDEF 12 LINEAR 00Z01Jan1990 1mo\n\
         VARS 1\nTAS 0 99 surface air temperature\nENDVARS\n",
        36,
    );
    let path = dir.path().join("run.ctl");

    let descriptor = parse_file(&path).unwrap();
    assert_eq!(descriptor.calendar, Calendar::NoLeap);
    assert_eq!(descriptor.dset.as_deref(), Some(dir.path().join("run.bin").as_path()));

    let ds = Dataset::open(&path, Attributes::new(), &LookupTable::default()).unwrap();
    let time = ds.variable("time").unwrap();
    assert_eq!(time.attributes["calendar"], AttributeValue::from("365_day"));
    assert_eq!(time.attributes["units"], AttributeValue::from("months since 1990-01-01 00:00:00"));
    assert_eq!(ds.dimensions()[1], ("level", 1));
    assert_eq!(ds.read_coordinate("lon", 0..3).unwrap().to_vec(), vec![0.0, 120.0, 240.0]);

    let last = ds.read_step("tas", 11).unwrap();
    assert_eq!(last.iter().copied().collect::<Vec<_>>(), vec![33.0, 34.0, 35.0]);
}

#[test]
fn test_lookup_file_enriches_variables() {
    let dir = TempDir::new().unwrap();
    write_pair(
        dir.path(),
        "dset ^run.bin\nundef -999\nxdef 1 linear 0 1\nydef 1 linear 0 1\nzdef 1 linear 0 1\n\
         tdef 1 linear 12Z05Jun2010 1dy\nvars 2\nPR 0 99 rain\nTMAX 0 99 hot\nendvars\n",
        2,
    );
    std::fs::write(
        dir.path().join("grads2netcdf.json"),
        r#"{"dataset": {"institution": "CSAG"},
            "variables": {"pr": {"standard_name": "precipitation_flux", "units": "kg m-2 s-1",
                                  "long_name": "Precipitation"}}}"#,
    )
    .unwrap();

    let lookup = load_lookup_or_default(&dir.path().join("grads2netcdf.json"));
    let ds = Dataset::open(&dir.path().join("run.ctl"), Attributes::new(), &lookup).unwrap();

    assert_eq!(ds.attributes["institution"], AttributeValue::from("CSAG"));
    let pr = ds.variable("pr").unwrap();
    assert_eq!(pr.attributes["long_name"], AttributeValue::from("Precipitation"));
    let tmax = ds.variable("tmax").unwrap();
    assert_eq!(tmax.attributes["standard_name"], AttributeValue::from("hot"));
    assert!(!tmax.attributes.contains_key("units"));
}

#[test]
fn test_missing_tdef_is_rejected_before_reading() {
    let dir = TempDir::new().unwrap();
    write_pair(
        dir.path(),
        "dset ^run.bin\nundef -999\nxdef 1 linear 0 1\nydef 1 linear 0 1\nzdef 1 linear 0 1\n\
         vars 1\nv 0 99 v\nendvars\n",
        1,
    );
    let err = Dataset::open(&dir.path().join("run.ctl"), Attributes::new(), &LookupTable::default())
        .unwrap_err();
    assert!(matches!(err, ConvertError::Config { .. }));
}
