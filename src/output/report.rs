use crate::provider::models::WarehouseHandle;

/// Tally of a batch creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Count the outcomes of a batch of creation attempts.
pub fn generate_report(handles: &[WarehouseHandle]) -> BatchReport {
    let succeeded = handles.iter().filter(|h| h.success).count();
    BatchReport {
        requested: handles.len(),
        succeeded,
        failed: handles.len() - succeeded,
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Created {} of {} warehouse(s)",
            self.succeeded, self.requested
        )?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        write!(f, ".")
    }
}
