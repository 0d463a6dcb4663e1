pub mod contextual;
pub mod ensemble;
pub mod error;
pub mod estimator;
pub mod model;
pub mod notifier;
pub mod oracle;
pub mod parser;
pub mod planner;
pub mod prompts;
pub mod regression;
pub mod remote;
pub mod source;

pub mod test_support;

pub use contextual::ContextualEstimator;
pub use ensemble::{EnsembleCombiner, EnsemblePricing};
pub use error::AgentError;
pub use estimator::PriceEstimator;
pub use model::{EnsembleModel, RegressionModel};
pub use notifier::{AlertChannel, Messenger, Notifier, NotifierCredentials};
pub use oracle::{OpenAiCompatibleOracle, OracleCredentials, OracleEndpoint, ScoringOracle};
pub use planner::{CycleReport, PlanState, Planner};
pub use regression::RegressionEstimator;
pub use remote::RemoteSpecialistEstimator;
pub use source::{DealSource, FileDealSource};
