use std::sync::Arc;

use handler::{Config, Dispatcher, Invocation, InvocationHandler, InvocationResponse};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use storage::PgConnector;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    // The platform timestamps every log line itself
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_ansi(false)
        .without_time()
        .with_target(true)
        .init();

    let config = Config::from_env()?;
    if config.database_url.is_none() {
        tracing::warn!("DATABASE_URL is not set, every request will fail");
    }

    let dispatcher = Arc::new(Dispatcher::new(config, PgConnector));
    tracing::info!("Workout function ready");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Invocation>| {
        let dispatcher = Arc::clone(&dispatcher);
        async move { Ok::<InvocationResponse, Error>(dispatcher.handle(event.payload).await) }
    }))
    .await
}
