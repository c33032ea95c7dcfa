use crate::scorecard::Scorecard;
use credit_scoring::config::ModelPaths;
use credit_scoring::error::AppError;
use credit_scoring::scoring::{ModelRole, PolicyConfig, Product, ScoringService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) service: Arc<ScoringService>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Artifact backing one model slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ModelSource {
    pub(crate) product: Product,
    pub(crate) role: ModelRole,
    pub(crate) path: PathBuf,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LoadReport {
    pub(crate) installed: usize,
    pub(crate) failed: usize,
}

/// Service whose mortgage pipeline includes the risk model only when an
/// artifact for it is configured.
pub(crate) fn build_service(paths: &ModelPaths) -> Arc<ScoringService> {
    Arc::new(ScoringService::new(
        PolicyConfig::default(),
        paths.mortgage_risk.is_some(),
    ))
}

pub(crate) fn model_sources(paths: &ModelPaths) -> Vec<ModelSource> {
    let source = |product, role, path: &PathBuf| ModelSource {
        product,
        role,
        path: path.clone(),
    };

    let mut sources = vec![
        source(
            Product::Mortgage,
            ModelRole::Approval,
            &paths.mortgage_approval,
        ),
        source(Product::Mortgage, ModelRole::Amount, &paths.mortgage_amount),
    ];
    if let Some(risk) = &paths.mortgage_risk {
        sources.push(source(Product::Mortgage, ModelRole::Risk, risk));
    }
    sources.extend([
        source(
            Product::CreditCard,
            ModelRole::Approval,
            &paths.credit_card_approval,
        ),
        source(
            Product::CreditCard,
            ModelRole::Amount,
            &paths.credit_card_limit,
        ),
        source(
            Product::PersonalLoan,
            ModelRole::Approval,
            &paths.loan_approval,
        ),
        source(Product::PersonalLoan, ModelRole::Amount, &paths.loan_amount),
        source(
            Product::CurrentAccount,
            ModelRole::Approval,
            &paths.current_account_approval,
        ),
    ]);
    sources
}

/// Installs every configured artifact. A model that fails to load is logged
/// and leaves its product unavailable; the others still load.
pub(crate) fn load_models(service: &ScoringService, paths: &ModelPaths) -> LoadReport {
    let mut report = LoadReport::default();

    for source in model_sources(paths) {
        match install_model(service, &source) {
            Ok(()) => {
                info!(
                    product = %source.product,
                    role = %source.role,
                    path = %source.path.display(),
                    "model loaded"
                );
                report.installed += 1;
            }
            Err(err) => {
                warn!(
                    product = %source.product,
                    role = %source.role,
                    error = %err,
                    "model unavailable"
                );
                report.failed += 1;
            }
        }
    }

    report
}

fn install_model(service: &ScoringService, source: &ModelSource) -> Result<(), AppError> {
    let scorecard =
        Scorecard::load(&source.path, source.role).map_err(|err| AppError::ModelArtifact {
            path: source.path.clone(),
            source: Box::new(err),
        })?;
    service.install(source.product, source.role, Arc::new(scorecard))?;
    Ok(())
}
