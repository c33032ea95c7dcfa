mod cli;
mod infra;
mod routes;
mod scorecard;
mod score;
mod server;

use credit_scoring::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
