/*!
 * Facade Statistics
 * Snapshots and usage reporting
 */

use super::NativeMemoryManager;
use crate::core::types::Size;
use crate::memory::traits::MemoryInfo;
use crate::memory::types::{MemoryPressure, MemoryRegion, MemoryResult, MemoryStats};
use std::collections::BTreeMap;
use tracing::{info, warn};

impl NativeMemoryManager {
    /// Snapshot of the active backend's statistics
    pub fn stats(&self) -> MemoryResult<MemoryStats> {
        Ok(self.state.lock().active()?.stats())
    }

    /// Address-ordered copy of every tracked region
    pub fn regions(&self) -> MemoryResult<Vec<MemoryRegion>> {
        Ok(self.state.lock().active()?.regions())
    }

    /// Bytes held per tag across used regions
    pub fn usage_by_tag(&self) -> MemoryResult<BTreeMap<String, Size>> {
        let regions = self.regions()?;
        Ok(regions
            .into_iter()
            .filter(|region| region.used)
            .fold(BTreeMap::new(), |mut usage, region| {
                *usage.entry(region.tag).or_insert(0) += region.size;
                usage
            }))
    }

    /// Emit current usage to the log, one event per tag
    pub fn log_usage(&self) {
        let stats = match self.stats() {
            Ok(stats) => stats,
            Err(e) => {
                info!(error = %e, "Memory usage unavailable");
                return;
            }
        };

        let pressure = stats.memory_pressure();
        if pressure >= MemoryPressure::High {
            warn!(
                backend = %stats.backend,
                %pressure,
                allocated = stats.allocated_memory,
                total = stats.total_memory,
                "Memory usage"
            );
        } else {
            info!(
                backend = %stats.backend,
                %pressure,
                allocated = stats.allocated_memory,
                available = stats.available_memory,
                used_regions = stats.used_regions,
                free_regions = stats.free_regions,
                fragmentation = stats.fragmentation_ratio,
                "Memory usage"
            );
        }

        if let Ok(usage) = self.usage_by_tag() {
            for (tag, bytes) in usage {
                info!(tag = tag.as_str(), bytes, "Memory usage by tag");
            }
        }
    }
}

impl MemoryInfo for NativeMemoryManager {
    fn stats(&self) -> MemoryResult<MemoryStats> {
        NativeMemoryManager::stats(self)
    }
}
