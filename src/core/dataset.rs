//! In-memory model of one converted grid and the binary slice reader.
//!
//! The binary file is laid out time-major: every time step holds one
//! `xsize * ysize` field of 32-bit floats per declared variable, in
//! declaration order, with no padding. A field of variable `v` at step `t`
//! therefore starts at `(nvars * fieldsize * t + fieldsize * index(v)) * 4`.

use crate::core::descriptor::{self, Calendar, Descriptor};
use crate::core::grid::Grid;
use crate::core::metadata::{self, LookupTable};
use crate::core::source::{ByteOrder, ByteSource};
use crate::core::time::TimeAxis;
use crate::domain::model::Attributes;
use crate::utils::error::{ConvertError, Result};
use ndarray::{Array1, Array3};
use std::collections::HashMap;
use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};

pub const FLOAT_SIZE: usize = 4;

/// Advisory read budget used to size time-batched reads.
pub const MAX_MEMORY_BYTES: usize = 512 * 1000 * 1024;

pub const TIME_DIM: &str = "time";
pub const LEVEL_DIM: &str = "level";
pub const LAT_DIM: &str = "lat";
pub const LON_DIM: &str = "lon";

/// How a variable's values are resolved, fixed when the variable is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    TimeAxis,
    LevelAxis,
    LatAxis,
    LonAxis,
    /// A declared field; `index` is its position in the varlist.
    DataField { index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub dimensions: Vec<&'static str>,
    pub attributes: Attributes,
    pub kind: VariableKind,
}

impl Variable {
    fn axis(name: &str, dimension: &'static str, kind: VariableKind, attributes: Attributes) -> Self {
        Self {
            name: name.to_string(),
            dimensions: vec![dimension],
            attributes,
            kind,
        }
    }

    pub fn is_coordinate(&self) -> bool {
        !matches!(self.kind, VariableKind::DataField { .. })
    }
}

/// Values of one variable over a requested index range.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableData {
    Axis(Array1<f64>),
    Field(Array3<f32>),
}

#[derive(Debug)]
pub struct Dataset<S: ByteSource = File> {
    pub attributes: Attributes,
    pub undef: f64,
    pub calendar: Calendar,
    pub grid: Grid,
    pub time: TimeAxis,
    pub data_path: PathBuf,
    pub byte_order: ByteOrder,
    varlist: Vec<String>,
    variables: Vec<Variable>,
    by_name: HashMap<String, usize>,
    source: S,
}

impl Dataset<File> {
    /// Parse the descriptor at `path` and open its binary data file.
    pub fn open(path: &Path, overrides: Attributes, lookup: &LookupTable) -> Result<Self> {
        let descriptor = descriptor::parse_file(path)?;
        let data_path = descriptor.require_dset()?.to_path_buf();
        let file = File::open(&data_path).map_err(|e| ConvertError::io(&data_path, e))?;
        tracing::info!("Opened binary data file {}", data_path.display());

        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self::from_descriptor(descriptor, file, overrides, lookup, &source_name)
    }
}

impl<S: ByteSource> Dataset<S> {
    /// Build the dataset model over an already opened byte source.
    /// `source_name` is recorded in the `history` attribute.
    pub fn from_descriptor(
        descriptor: Descriptor,
        source: S,
        overrides: Attributes,
        lookup: &LookupTable,
        source_name: &str,
    ) -> Result<Self> {
        let grid = descriptor.require_grid()?;
        let time = descriptor.require_time()?.clone();
        let undef = descriptor.require_undef()?;
        let data_path = descriptor.require_dset()?.to_path_buf();

        let mut attributes = overrides;
        if !attributes.contains_key("title") {
            if let Some(title) = &descriptor.title {
                attributes.insert("title".into(), title.as_str().into());
            }
        }
        attributes.insert("history".into(), history_entry(source_name).into());
        metadata::merge_dataset_attributes(&mut attributes, lookup);

        let mut variables = vec![
            Variable::axis(
                TIME_DIM,
                TIME_DIM,
                VariableKind::TimeAxis,
                metadata::time_attributes(&time.units(), descriptor.calendar.as_str()),
            ),
            Variable::axis(LEVEL_DIM, LEVEL_DIM, VariableKind::LevelAxis, metadata::level_attributes()),
            Variable::axis(LAT_DIM, LAT_DIM, VariableKind::LatAxis, metadata::latitude_attributes()),
            Variable::axis(LON_DIM, LON_DIM, VariableKind::LonAxis, metadata::longitude_attributes()),
        ];
        for (index, decl) in descriptor.variables.iter().enumerate() {
            variables.push(Variable {
                name: decl.name.clone(),
                dimensions: vec![TIME_DIM, LAT_DIM, LON_DIM],
                attributes: metadata::variable_attributes(&decl.name, &decl.description, lookup),
                kind: VariableKind::DataField { index },
            });
        }
        let by_name = variables
            .iter()
            .enumerate()
            .map(|(i, v)| (v.name.clone(), i))
            .collect();

        tracing::info!(
            "Dataset {}x{}x{} with {} time steps and {} variables",
            grid.lon.count,
            grid.lat.count,
            grid.level.count,
            time.count,
            descriptor.variables.len()
        );

        Ok(Self {
            attributes,
            undef,
            calendar: descriptor.calendar,
            grid,
            time,
            data_path,
            byte_order: descriptor.byte_order,
            varlist: descriptor.varlist(),
            variables,
            by_name,
            source,
        })
    }

    /// Dimensions in output order.
    pub fn dimensions(&self) -> [(&'static str, usize); 4] {
        [
            (TIME_DIM, self.time.count),
            (LEVEL_DIM, self.grid.level.count),
            (LAT_DIM, self.grid.lat.count),
            (LON_DIM, self.grid.lon.count),
        ]
    }

    /// Declared variable names in on-disk order.
    pub fn varlist(&self) -> &[String] {
        &self.varlist
    }

    /// Coordinate variables first, then data fields in declaration order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.by_name.get(name).map(|&i| &self.variables[i])
    }

    pub fn read(&self, name: &str, range: Range<usize>) -> Result<VariableData> {
        let variable = self.variable(name).ok_or_else(|| ConvertError::UnknownVariable {
            name: name.to_string(),
        })?;
        match variable.kind {
            VariableKind::DataField { index } => {
                self.read_field_at(name, index, range).map(VariableData::Field)
            }
            _ => self.read_coordinate(name, range).map(VariableData::Axis),
        }
    }

    /// Coordinate values for `time`, `level`, `lat` or `lon`, sliced by index.
    pub fn read_coordinate(&self, name: &str, range: Range<usize>) -> Result<Array1<f64>> {
        let kind = self.variable(name).map(|v| v.kind);
        let values = match kind {
            Some(VariableKind::TimeAxis) => self.time.values(),
            Some(VariableKind::LevelAxis) => self.grid.level.values(),
            Some(VariableKind::LatAxis) => self.grid.lat.values(),
            Some(VariableKind::LonAxis) => self.grid.lon.values(),
            _ => {
                return Err(ConvertError::UnknownVariable {
                    name: name.to_string(),
                })
            }
        };
        check_range(name, &range, values.len())?;
        Ok(values.slice_move(ndarray::s![range]))
    }

    /// Read `times` of a declared field as a `(ntimes, ysize, xsize)` array.
    pub fn read_field(&self, name: &str, times: Range<usize>) -> Result<Array3<f32>> {
        let index = self
            .varlist
            .iter()
            .position(|v| v == name)
            .ok_or_else(|| ConvertError::UnknownVariable {
                name: name.to_string(),
            })?;
        self.read_field_at(name, index, times)
    }

    /// Single time step, shaped `(1, ysize, xsize)`.
    pub fn read_step(&self, name: &str, t: usize) -> Result<Array3<f32>> {
        self.read_field(name, t..t.saturating_add(1))
    }

    /// Byte offset of the field of variable `index` at time step `t`.
    pub fn field_offset(&self, index: usize, t: usize) -> u64 {
        let fieldsize = self.grid.field_size() as u64;
        let nvars = self.varlist.len() as u64;
        (nvars * fieldsize * t as u64 + fieldsize * index as u64) * FLOAT_SIZE as u64
    }

    fn read_field_at(&self, name: &str, index: usize, times: Range<usize>) -> Result<Array3<f32>> {
        check_range(name, &times, self.time.count)?;

        let fieldsize = self.grid.field_size();
        let ntimes = times.len();
        let mut values = Vec::with_capacity(fieldsize * ntimes);
        let mut buf = vec![0u8; fieldsize * FLOAT_SIZE];

        // Other variables' fields sit between consecutive steps, so each
        // step is its own positioned read.
        for t in times {
            let offset = self.field_offset(index, t);
            self.source
                .read_exact_at(&mut buf, offset)
                .map_err(|source| ConvertError::Read {
                    path: self.data_path.clone(),
                    offset,
                    source,
                })?;
            values.extend(self.byte_order.decode_f32(&buf));
        }
        tracing::debug!("Read {} step(s) of '{}'", ntimes, name);

        Array3::from_shape_vec((ntimes, self.grid.lat.count, self.grid.lon.count), values)
            .map_err(|e| ConvertError::config(format!("cannot shape '{}': {}", name, e)))
    }
}

fn check_range(name: &str, range: &Range<usize>, len: usize) -> Result<()> {
    if range.start > range.end || range.end > len {
        return Err(ConvertError::OutOfRange {
            name: name.to_string(),
            start: range.start,
            end: range.end,
            len,
        });
    }
    Ok(())
}

fn history_entry(source_name: &str) -> String {
    format!(
        "{}: grads2nc {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f"),
        source_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::AttributeValue;

    const CTL: &str = "\
dset ^data.bin
undef -999
xdef 2 linear 0 1
ydef 2 linear 10 5
zdef 0 linear 0 1
tdef 3 linear 00Z01Jan2000 1dy
vars 2
a 0 99 first
b 0 99 second
endvars
";

    /// Value at (variable, t, cell) encodes its own position.
    fn bytes() -> Vec<u8> {
        let mut out = Vec::new();
        for t in 0..3 {
            for v in 0..2 {
                for cell in 0..4 {
                    let value = (t * 100 + v * 10 + cell) as f32;
                    out.extend(value.to_ne_bytes());
                }
            }
        }
        out
    }

    fn dataset(ctl: &str, data: Vec<u8>) -> Dataset<Vec<u8>> {
        let descriptor = descriptor::parse_str(ctl, "/tmp").unwrap();
        Dataset::from_descriptor(descriptor, data, Attributes::new(), &LookupTable::default(), "t.ctl")
            .unwrap()
    }

    #[test]
    fn test_offset_skips_other_variables() {
        let ds = dataset(CTL, bytes());
        assert_eq!(ds.field_offset(1, 1), 48);
        assert_eq!(ds.field_offset(0, 0), 0);
        assert_eq!(ds.field_offset(0, 2), 64);
    }

    #[test]
    fn test_read_single_step() {
        let ds = dataset(CTL, bytes());
        let b = ds.read_step("b", 1).unwrap();
        assert_eq!(b.shape(), &[1, 2, 2]);
        assert_eq!(b.iter().copied().collect::<Vec<_>>(), vec![110.0, 111.0, 112.0, 113.0]);
        // longitude varies fastest
        assert_eq!(b[[0, 1, 0]], 112.0);
    }

    #[test]
    fn test_multi_step_read_strides_over_other_fields() {
        let ds = dataset(CTL, bytes());
        let a = ds.read_field("a", 0..3).unwrap();
        assert_eq!(a.shape(), &[3, 2, 2]);
        assert_eq!(a[[0, 0, 0]], 0.0);
        assert_eq!(a[[1, 0, 0]], 100.0);
        assert_eq!(a[[2, 1, 1]], 203.0);
    }

    #[test]
    fn test_unknown_variable() {
        let ds = dataset(CTL, bytes());
        assert!(matches!(ds.read_field("c", 0..1), Err(ConvertError::UnknownVariable { .. })));
        assert!(matches!(ds.read("zz", 0..1), Err(ConvertError::UnknownVariable { .. })));
        assert!(matches!(ds.read_field("lat", 0..1), Err(ConvertError::UnknownVariable { .. })));
    }

    #[test]
    fn test_out_of_range() {
        let ds = dataset(CTL, bytes());
        assert!(matches!(ds.read_field("a", 2..4), Err(ConvertError::OutOfRange { .. })));
        assert!(matches!(ds.read_step("a", 3), Err(ConvertError::OutOfRange { .. })));
        assert!(matches!(ds.read_coordinate("lon", 0..3), Err(ConvertError::OutOfRange { .. })));
    }

    #[test]
    fn test_truncated_source_is_read_error() {
        let mut data = bytes();
        data.truncate(40);
        let ds = dataset(CTL, data);
        assert!(ds.read_step("a", 0).is_ok());
        assert!(matches!(ds.read_step("b", 1), Err(ConvertError::Read { offset: 48, .. })));
    }

    #[test]
    fn test_coordinates() {
        let ds = dataset(CTL, bytes());
        assert_eq!(ds.read_coordinate("time", 0..3).unwrap().to_vec(), vec![0.0, 1.0, 2.0]);
        assert_eq!(ds.read_coordinate("lat", 0..2).unwrap().to_vec(), vec![10.0, 15.0]);
        assert_eq!(ds.read_coordinate("lon", 1..2).unwrap().to_vec(), vec![1.0]);
        assert_eq!(ds.read_coordinate("level", 0..1).unwrap().to_vec(), vec![0.0]);
        match ds.read("lat", 0..2).unwrap() {
            VariableData::Axis(values) => assert_eq!(values.len(), 2),
            VariableData::Field(_) => panic!("lat resolved as a field"),
        }
    }

    #[test]
    fn test_time_attributes_and_calendar() {
        let ds = dataset(CTL, bytes());
        let time = ds.variable("time").unwrap();
        assert_eq!(time.attributes["units"], AttributeValue::from("days since 2000-01-01 00:00:00"));
        assert_eq!(time.attributes["calendar"], AttributeValue::from("standard"));

        let noleap = format!("options 365_day_calendar\n{}", CTL);
        let ds = dataset(&noleap, bytes());
        assert_eq!(ds.variable("time").unwrap().attributes["calendar"], AttributeValue::from("365_day"));
    }

    #[test]
    fn test_variable_table() {
        let ds = dataset(CTL, bytes());
        assert_eq!(ds.varlist(), &["a".to_string(), "b".to_string()]);
        let names: Vec<&str> = ds.variables().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["time", "level", "lat", "lon", "a", "b"]);
        let b = ds.variable("b").unwrap();
        assert_eq!(b.dimensions, vec!["time", "lat", "lon"]);
        assert_eq!(b.kind, VariableKind::DataField { index: 1 });
        assert!(!b.is_coordinate());
        assert_eq!(b.attributes["standard_name"], AttributeValue::from("second"));
        assert_eq!(ds.dimensions(), [("time", 3), ("level", 1), ("lat", 2), ("lon", 2)]);
    }

    #[test]
    fn test_global_attributes() {
        let with_title = format!("title Test run\n{}", CTL);
        let ds = dataset(&with_title, bytes());
        assert_eq!(ds.attributes["title"], AttributeValue::from("Test run"));
        let history = ds.attributes["history"].as_str().unwrap();
        assert!(history.ends_with(": grads2nc t.ctl\n"));

        let descriptor = descriptor::parse_str(&with_title, "/tmp").unwrap();
        let overrides = Attributes::from([("title".to_string(), AttributeValue::from("mine"))]);
        let ds = Dataset::from_descriptor(descriptor, bytes(), overrides, &LookupTable::default(), "t.ctl")
            .unwrap();
        assert_eq!(ds.attributes["title"], AttributeValue::from("mine"));
    }

    #[test]
    fn test_missing_grid_is_config_error() {
        let descriptor = descriptor::parse_str("dset x\nundef 0\nvars 1\na 0 99 a\nendvars\n", ".")
            .unwrap();
        let err = Dataset::from_descriptor(
            descriptor,
            Vec::new(),
            Attributes::new(),
            &LookupTable::default(),
            "x.ctl",
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::Config { .. }));
    }

    #[test]
    fn test_big_endian_data() {
        let ctl = format!("options big_endian\n{}", CTL);
        let mut data = Vec::new();
        for i in 0..24 {
            data.extend((i as f32).to_be_bytes());
        }
        let ds = dataset(&ctl, data);
        assert_eq!(ds.read_step("b", 0).unwrap().iter().copied().collect::<Vec<_>>(), vec![4.0, 5.0, 6.0, 7.0]);
    }
}
