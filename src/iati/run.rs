//! Batch loop over countries

use crate::iati::assemble::{AssembleOutcome, DatasetAssembler};
use crate::iati::config::StaticTemplate;
use crate::iati::publish::DatasetSink;
use crate::iati::types::{Country, RunStats};
use tracing::{error, info, warn};

/// Assemble, finalize and create a dataset for every country.
///
/// A skipped country or a failing one never stops the batch; failures are counted.
pub async fn generate_datasets(
    assembler: &DatasetAssembler<'_>,
    countries: &[Country],
    static_template: &StaticTemplate,
    sink: &mut dyn DatasetSink,
) -> RunStats {
    let mut stats = RunStats::default();

    for country in countries {
        info!("=== {} ===", country);

        let outcome = match assembler.assemble(country).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("✗ {} failed: {:#}", country.iso2, e);
                stats.errors += 1;
                continue;
            }
        };

        let mut dataset = match outcome {
            AssembleOutcome::Found(dataset) => dataset,
            AssembleOutcome::Skipped(reason) => {
                warn!("Skipping {}: {}", country, reason);
                stats.skipped += 1;
                continue;
            }
        };

        dataset.update_from_static(static_template);
        match sink.create(&dataset) {
            Ok(()) => {
                info!("✓ {} created", dataset.name);
                stats.created += 1;
            }
            Err(e) => {
                error!("✗ {} could not be created: {:#}", dataset.name, e);
                stats.errors += 1;
            }
        }
    }

    info!("Run complete: {}", stats);
    stats
}
