use crate::statistics::map::{FullStatisticsMap, StatisticsMap};
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Deserialize, Serialize)]
pub struct GenerationStatistics {
    pub successful_mapping: StatisticsMap,
    pub failed_mapping: StatisticsMap,
    pub max_failed_stmt_attempts: usize,
    pub max_failed_expr_attempts: usize,
    pub max_failed_ty_attempts: usize,
}

#[derive(Default, Debug, Clone, Deserialize, Serialize)]
pub struct FullGenerationStatistics {
    pub successful_mapping: FullStatisticsMap,
    pub failed_mapping: FullStatisticsMap,
    pub max_failed_stmt_attempts: usize,
    pub max_failed_expr_attempts: usize,
    pub max_failed_ty_attempts: usize,
}

impl From<GenerationStatistics> for FullGenerationStatistics {
    fn from(stats: GenerationStatistics) -> FullGenerationStatistics {
        FullGenerationStatistics {
            successful_mapping: stats.successful_mapping.into(),
            failed_mapping: stats.failed_mapping.into(),
            max_failed_stmt_attempts: stats.max_failed_stmt_attempts,
            max_failed_expr_attempts: stats.max_failed_expr_attempts,
            max_failed_ty_attempts: stats.max_failed_ty_attempts,
        }
    }
}
