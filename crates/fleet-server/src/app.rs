//! Service wiring and the server loop.

use std::sync::Arc;

use fleet_auth::oauth::{GoogleClient, LineClient, OAuthClient};
use fleet_auth::{AuthConfig, AuthService, InvitationService, TokenService};
use fleet_db::DbManager;
use fleet_db::repository::{
    SurrealAppUserRepository, SurrealEntityStore, SurrealInvitationRepository,
    SurrealMembershipRepository, SurrealOAuthAccountRepository, SurrealOrganizationRepository,
};
use surrealdb::{Connection, Surreal};
use tonic::service::{Routes, RoutesBuilder};
use tonic::transport::Server;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::grpc::GrpcServer;
use crate::layers::call_layers;
use crate::services::app_user::AppUserApi;
use crate::services::auth::AuthApi;
use crate::services::entity::add_entity_services;
use crate::services::health::HealthApi;
use crate::services::invitation::InvitationApi;
use crate::services::membership::MembershipApi;
use crate::services::organization::OrganizationApi;
use crate::shutdown::shutdown_signal;

/// Every service of the server, backed by `db`.
pub fn routes<C: Connection>(
    db: Surreal<C>,
    config: &AuthConfig,
    providers: Vec<OAuthClient>,
) -> Routes {
    let auth = AuthService::new(
        SurrealAppUserRepository::new(db.clone()),
        SurrealOAuthAccountRepository::new(db.clone()),
        TokenService::new(config),
        providers,
    );
    let invitations = InvitationService::new(
        SurrealInvitationRepository::new(db.clone()),
        SurrealOrganizationRepository::new(db.clone()),
        config.clone(),
    );

    let mut builder = RoutesBuilder::default();
    builder
        .add_service(GrpcServer::new(HealthApi::new(db.clone())))
        .add_service(GrpcServer::new(AuthApi::new(Arc::new(auth))))
        .add_service(GrpcServer::new(OrganizationApi::new(
            SurrealOrganizationRepository::new(db.clone()),
        )))
        .add_service(GrpcServer::new(AppUserApi::new(
            SurrealAppUserRepository::new(db.clone()),
        )))
        .add_service(GrpcServer::new(MembershipApi::new(
            SurrealMembershipRepository::new(db.clone()),
        )))
        .add_service(GrpcServer::new(InvitationApi::new(invitations)));
    add_entity_services(&mut builder, Arc::new(SurrealEntityStore::new(db)));
    builder.routes()
}

fn providers(config: &ServerConfig) -> Vec<OAuthClient> {
    let http = reqwest::Client::new();
    let mut providers = Vec::new();
    if let Some(google) = config.google() {
        providers.push(OAuthClient::Google(GoogleClient::new(google, http.clone())));
    }
    if let Some(line) = config.line() {
        providers.push(OAuthClient::Line(LineClient::new(line, http)));
    }
    providers
}

/// Connect to the database and serve until a shutdown signal.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    if config.jwt_secret.is_empty() {
        return Err(ServerError::Config("JWT_SECRET must not be empty".into()));
    }
    let auth = config.auth();
    let providers = providers(&config);
    if providers.is_empty() {
        warn!("no OAuth provider configured; logins will fail");
    }

    let db = DbManager::connect(&config.database()).await?;
    let routes = routes(db.client().clone(), &auth, providers);

    let addr = config.listen_addr();
    info!(%addr, require_auth = config.require_auth, "gRPC server listening");
    Server::builder()
        .layer(call_layers(TokenService::new(&auth), config.require_auth))
        .add_routes(routes)
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    info!("gRPC server stopped");
    Ok(())
}
