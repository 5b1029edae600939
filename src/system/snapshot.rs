/// System-wide resource usage, sampled independently of the process list.
/// Each field defaults to zero when its source cannot be read.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemSummary {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_available_gb: f64,
    pub memory_total_gb: f64,
    pub disk_usage_percent: f64,
}
