use supervisor_allocation_backend::error::AppError;
use supervisor_allocation_backend::run_server;
use supervisor_allocation_backend::telemetry::setup_telemetry;
use supervisor_allocation_config::get_config;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = get_config()?;
    setup_telemetry(config.log_filter.as_deref());
    run_server(config).await
}
