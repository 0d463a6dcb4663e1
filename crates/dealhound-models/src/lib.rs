pub mod config;
pub mod estimate;
pub mod index_schema;
pub mod listing;
pub mod memory;

pub use config::{
    DealhoundConfig, IndexConfig, ModelsConfig, NotifierConfig, OracleConfig, PlannerConfig,
    SourceConfig, SpecialistConfig,
};
pub use estimate::{EnsembleFeatures, PriceEstimate, SimilarItem, ENSEMBLE_COLUMNS};
pub use index_schema::{DistanceMetric, DocumentRow};
pub use listing::{Listing, Opportunity};
pub use memory::Memory;
