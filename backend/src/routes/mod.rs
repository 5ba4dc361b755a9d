//! Route definitions for the BizTally API

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - projects and teams
        .nest("/projects", project_routes())
        .nest("/teams", team_routes())
        // Protected routes - cycles
        .nest("/cycles", cycle_routes())
        // Protected routes - products and variants
        .nest("/products", product_routes())
        // Protected routes - sales
        .nest("/sales", sale_routes())
        // Protected routes - expenses
        .nest("/expenses", expense_routes())
        // Protected routes - customers
        .nest("/customers", customer_routes())
        // Protected routes - inventory ledgers
        .nest("/inventory", inventory_routes())
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Project management routes (protected)
fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_projects).post(handlers::create_project))
        .route("/:project_id/members", post(handlers::add_project_member))
        .route(
            "/:project_id/members/:user_id",
            delete(handlers::remove_project_member),
        )
        .route("/:project_id/teams", post(handlers::assign_project_team))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Team management routes (protected)
fn team_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_teams).post(handlers::create_team))
        .route("/:team_id/members", post(handlers::add_team_member))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Cycle management routes (protected)
fn cycle_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_cycles).post(handlers::create_cycle))
        .route("/:cycle_id", get(handlers::get_cycle))
        .route("/:cycle_id/lock", post(handlers::lock_cycle))
        .route("/:cycle_id/unlock", post(handlers::unlock_cycle))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product management routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:product_id/variants", post(handlers::create_variant))
        .route(
            "/:product_id/variants/:variant_id",
            put(handlers::update_variant).delete(handlers::delete_variant),
        )
        .route(
            "/:product_id/adjustments",
            post(handlers::adjust_product_stock),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Sale routes (protected)
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_sales)
                .post(handlers::create_sale)
                .put(handlers::update_sale)
                .delete(handlers::delete_sale),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Expense routes (protected)
fn expense_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route(
            "/:expense_id",
            put(handlers::update_expense).delete(handlers::delete_expense),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Customer routes (protected)
fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_customers))
        .route("/:customer_id", get(handlers::get_customer))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Inventory ledger routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(handlers::list_transactions))
        .route("/movements", get(handlers::list_movements))
        .route_layer(middleware::from_fn(auth_middleware))
}
