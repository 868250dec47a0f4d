use dagger_sdk::{Query, Service};
use gradle_service::{DaggerBackend, GradleService, PipelineConfig};

use crate::cli::{Cli, Command};

pub async fn run(cli: Cli, config: PipelineConfig, client: Query) -> eyre::Result<()> {
    let backend = DaggerBackend::new(client);
    let source = backend.source(&cli.pipeline.source)?;
    let service = GradleService::new(backend, config).configure(source);

    match cli.command {
        Command::Build => {
            service.compile().await?;
            tracing::info!("build succeeded");
        }
        Command::Test => {
            service.run_tests().await?;
            tracing::info!("tests passed");
        }
        Command::Package { output } => {
            let image = service.package_runtime().await?;
            match output {
                Some(path) => {
                    image.export(path.to_string_lossy().to_string()).await?;
                    tracing::info!(path = %path.display(), "exported runtime image");
                }
                None => {
                    image.sync().await?;
                    tracing::info!("runtime image built");
                }
            }
        }
        Command::Publish { registry, tag } => {
            let reference = service.publish(&registry, &tag).await?;
            println!("{reference}");
        }
        Command::Serve { init_script } => {
            let init_script = service.backend().host_file(&init_script);
            let app = service.as_service(init_script).await?;
            tracing::info!(port = service.config().app_port, "starting service");
            expose(service.backend().client(), app).await?;
        }
        Command::Mysql { init_script } => {
            let init_script = service.backend().host_file(&init_script);
            let database = service.auxiliary_database(init_script);
            expose(service.backend().client(), database).await?;
        }
        // printed before connecting to the engine
        Command::Config => {}
    }

    Ok(())
}

/// Tunnels `service` to the host and keeps it up until ctrl-c.
async fn expose(client: &Query, service: Service) -> eyre::Result<()> {
    let tunnel = client.host().tunnel(service);
    tunnel.start().await?;

    let endpoint = tunnel.endpoint().await?;
    tracing::info!(endpoint = %endpoint, "service is up, press ctrl-c to stop");
    println!("{endpoint}");

    tokio::signal::ctrl_c().await?;

    tunnel.stop().await?;

    Ok(())
}
