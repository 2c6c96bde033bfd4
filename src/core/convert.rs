use crate::core::dataset::{Dataset, FLOAT_SIZE};
use crate::core::source::ByteSource;
use crate::domain::ports::ArraySink;
use crate::utils::error::Result;
use crate::utils::monitor::MemoryMonitor;

/// How many time steps of one variable are materialised per read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPlan {
    /// Every time step in a single array.
    Whole,
    /// Batches sized so one batch fits `budget_bytes`.
    Chunked { budget_bytes: usize },
}

impl ReadPlan {
    /// Time steps per batch for a grid with `field_size` cells.
    pub fn steps_per_read(&self, field_size: usize, tsize: usize) -> usize {
        match self {
            Self::Whole => tsize.max(1),
            Self::Chunked { budget_bytes } => {
                (budget_bytes / FLOAT_SIZE / field_size.max(1)).max(1)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub variables: usize,
    pub time_steps: usize,
    pub reads: usize,
}

pub struct Converter {
    plan: ReadPlan,
    monitor: MemoryMonitor,
}

impl Converter {
    pub fn new(plan: ReadPlan) -> Self {
        Self {
            plan,
            monitor: MemoryMonitor::new(false, 0),
        }
    }

    pub fn new_with_monitoring(plan: ReadPlan, monitor_enabled: bool, budget_bytes: usize) -> Self {
        Self {
            plan,
            monitor: MemoryMonitor::new(monitor_enabled, budget_bytes),
        }
    }

    /// Write the whole dataset into `sink`. The sink is only finished
    /// when every variable has been written.
    pub fn run<S, K>(&mut self, dataset: &Dataset<S>, mut sink: K) -> Result<ConversionSummary>
    where
        S: ByteSource,
        K: ArraySink,
    {
        tracing::info!("Writing global attributes and dimensions");
        for (name, value) in &dataset.attributes {
            sink.add_global_attribute(name, value)?;
        }
        for (name, len) in dataset.dimensions() {
            sink.add_dimension(name, len)?;
        }

        let fill_value = dataset.undef as f32;
        for variable in dataset.variables() {
            sink.add_variable(
                &variable.name,
                &variable.dimensions,
                fill_value,
                &variable.attributes,
            )?;
        }

        for variable in dataset.variables().iter().filter(|v| v.is_coordinate()) {
            let len = dataset
                .dimensions()
                .iter()
                .find(|(dim, _)| *dim == variable.dimensions[0])
                .map(|(_, len)| *len)
                .unwrap_or(0);
            let values = dataset.read_coordinate(&variable.name, 0..len)?;
            sink.put_coordinate(&variable.name, &values.to_vec())?;
        }

        let tsize = dataset.time.count;
        let step = self.plan.steps_per_read(dataset.grid.field_size(), tsize);
        let mut reads = 0;
        tracing::info!(
            "Converting {} variable(s), {} time step(s) per read",
            dataset.varlist().len(),
            step
        );

        for name in dataset.varlist() {
            let mut t0 = 0;
            while t0 < tsize {
                let t1 = (t0 + step).min(tsize);
                let data = dataset.read_field(name, t0..t1)?;
                sink.put_field(name, t0, &data)?;
                reads += 1;
                t0 = t1;
            }
            tracing::debug!("Converted '{}'", name);
            self.monitor.log_stats(&format!("variable '{}'", name));
        }

        sink.finish()?;
        self.monitor.log_final_stats();

        Ok(ConversionSummary {
            variables: dataset.varlist().len(),
            time_steps: tsize,
            reads,
        })
    }
}
