use crate::domain::model::{AttributeValue, Attributes};
use crate::domain::ports::ArraySink;
use crate::utils::error::{ConvertError, Result};
use ndarray::Array3;
use std::path::{Path, PathBuf};

/// netCDF classic (CDF-1) writer. Data goes to `<target>.partial` and is
/// renamed onto the target by `finish`; an unfinished sink removes its partial file.
pub struct NetcdfSink {
    file: Option<netcdf::FileMut>,
    partial: PathBuf,
    target: PathBuf,
}

impl NetcdfSink {
    pub fn create(target: &Path) -> Result<Self> {
        let partial = partial_path(target);
        if partial.exists() {
            std::fs::remove_file(&partial).map_err(|e| ConvertError::io(&partial, e))?;
        }

        // No format flags selects the classic format and clobbers.
        let file = netcdf::create_with(&partial, netcdf::Options::empty())
            .map_err(netcdf_error(target))?;
        tracing::debug!("Writing netCDF classic data to {}", partial.display());

        Ok(Self {
            file: Some(file),
            partial,
            target: target.to_path_buf(),
        })
    }

    /// The open file together with the path reported in errors.
    fn parts(&mut self) -> Result<(&mut netcdf::FileMut, &Path)> {
        match self.file.as_mut() {
            Some(file) => Ok((file, &self.target)),
            None => Err(ConvertError::config("netCDF sink already finished")),
        }
    }
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}

fn netcdf_error(path: &Path) -> impl Fn(netcdf::Error) -> ConvertError + '_ {
    move |source| ConvertError::Netcdf {
        path: path.to_path_buf(),
        source,
    }
}

impl ArraySink for NetcdfSink {
    fn add_global_attribute(&mut self, name: &str, value: &AttributeValue) -> Result<()> {
        let (file, path) = self.parts()?;
        let written = match value {
            AttributeValue::Text(s) => file.add_attribute(name, s.as_str()),
            AttributeValue::Float(f) => file.add_attribute(name, *f),
            AttributeValue::Int(i) => match i32::try_from(*i) {
                Ok(small) => file.add_attribute(name, small),
                Err(_) => file.add_attribute(name, *i as f64),
            },
        };
        written.map_err(netcdf_error(path))?;
        Ok(())
    }

    fn add_dimension(&mut self, name: &str, len: usize) -> Result<()> {
        let (file, path) = self.parts()?;
        file.add_dimension(name, len).map_err(netcdf_error(path))?;
        Ok(())
    }

    fn add_variable(
        &mut self,
        name: &str,
        dimensions: &[&str],
        fill_value: f32,
        attributes: &Attributes,
    ) -> Result<()> {
        let (file, path) = self.parts()?;
        let mut var = file
            .add_variable::<f32>(name, dimensions)
            .map_err(netcdf_error(path))?;
        var.set_fill_value(fill_value).map_err(netcdf_error(path))?;
        for (key, value) in attributes {
            let written = match value {
                AttributeValue::Text(s) => var.put_attribute(key, s.as_str()),
                AttributeValue::Float(f) => var.put_attribute(key, *f),
                AttributeValue::Int(i) => match i32::try_from(*i) {
                    Ok(small) => var.put_attribute(key, small),
                    Err(_) => var.put_attribute(key, *i as f64),
                },
            };
            written.map_err(netcdf_error(path))?;
        }
        Ok(())
    }

    fn put_coordinate(&mut self, name: &str, values: &[f64]) -> Result<()> {
        let values: Vec<f32> = values.iter().map(|v| *v as f32).collect();
        let (file, path) = self.parts()?;
        let mut var = file.variable_mut(name).ok_or_else(|| undefined(name))?;
        var.put_values(&values, ..).map_err(netcdf_error(path))?;
        Ok(())
    }

    fn put_field(&mut self, name: &str, t0: usize, data: &Array3<f32>) -> Result<()> {
        let (ntimes, ny, nx) = data.dim();
        let data = data.as_standard_layout();
        let values = data
            .as_slice()
            .ok_or_else(|| ConvertError::config(format!("'{}' is not contiguous", name)))?;
        let (file, path) = self.parts()?;
        let mut var = file.variable_mut(name).ok_or_else(|| undefined(name))?;
        var.put_values(values, [t0..t0 + ntimes, 0..ny, 0..nx])
            .map_err(netcdf_error(path))?;
        Ok(())
    }

    fn finish(mut self) -> Result<()> {
        // Closing the handle flushes the header and data.
        drop(self.file.take());
        std::fs::rename(&self.partial, &self.target)
            .map_err(|e| ConvertError::io(&self.target, e))?;
        tracing::info!("📁 Wrote {}", self.target.display());
        Ok(())
    }
}

fn undefined(name: &str) -> ConvertError {
    ConvertError::config(format!("variable '{}' was never defined", name))
}

impl Drop for NetcdfSink {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            drop(file);
            if let Err(e) = std::fs::remove_file(&self.partial) {
                tracing::warn!("Could not remove {}: {}", self.partial.display(), e);
            } else {
                tracing::debug!("Removed unfinished {}", self.partial.display());
            }
        }
    }
}
