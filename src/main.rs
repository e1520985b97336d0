use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use log::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ledgerd::{api, ledger, node};

/// A minimal proof-of-work ledger node
#[derive(Parser)]
#[command(name = "ledgerd", version, about)]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind the HTTP server to
    #[arg(long, default_value_t = 5000)]
    port: u16,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::mine,
        api::handlers::new_transaction,
        api::handlers::get_chain,
        api::handlers::register_nodes,
        api::handlers::resolve_conflicts
    ),
    components(
        schemas(
            ledger::Block,
            ledger::Transaction,
            api::handlers::ChainResponse,
            api::handlers::TransactionRequest,
            api::handlers::MessageResponse,
            api::handlers::MineResponse,
            api::handlers::RegisterRequest,
            api::handlers::RegisterResponse
        )
    ),
    tags(
        (name = "ledger", description = "Ledger node API endpoints")
    ),
    info(
        title = "Ledger Node API",
        version = "0.1.0",
        description = "A minimal proof-of-work ledger node"
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    // Explicitly constructed node state, shared with every handler
    let node = web::Data::new(node::Node::new());
    info!("Node identity: {}", node.id);
    info!("Starting HTTP server at http://{}:{}", cli.host, cli.port);

    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        // Configure OpenAPI documentation
        let openapi = ApiDoc::openapi();

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(node.clone())
            // API routes
            .configure(api::configure_routes)
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((cli.host.as_str(), cli.port))?
    .run()
    .await
}
