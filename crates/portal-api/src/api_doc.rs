//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use portal_core::models;

struct SessionSecurity;

impl Modify for SessionSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Compliance Document Portal API",
        version = "0.1.0",
        description = "Companies log in, see which of the ten required compliance documents they have submitted, and upload or remove them. Operators manage company accounts. All endpoints are versioned under /api/v1/."
    ),
    paths(
        // Sessions
        handlers::auth::login,
        handlers::auth::admin_login,
        // Company
        handlers::checklist::get_checklist,
        handlers::documents::upload_document,
        handlers::documents::list_documents,
        handlers::documents::delete_document,
        // Operator
        handlers::admin::list_companies,
        handlers::admin::create_company,
        handlers::admin::update_company,
        handlers::admin::delete_company,
        handlers::admin::company_documents,
        handlers::maintenance::run_sweep,
        // Downloads
        handlers::files::download_file,
    ),
    components(
        schemas(
            models::DocumentType,
            models::UploadStatus,
            models::ChecklistEntry,
            models::ChecklistResponse,
            models::DocumentResponse,
            models::LoginRequest,
            models::LoginResponse,
            models::AdminLoginResponse,
            models::CompanyResponse,
            models::CreateCompanyRequest,
            models::UpdateCompanyRequest,
            models::SweepReport,
            error::ErrorResponse,
        )
    ),
    modifiers(&SessionSecurity),
    tags(
        (name = "auth", description = "Company login"),
        (name = "checklist", description = "Submission status of the required documents"),
        (name = "documents", description = "Document upload, listing and removal"),
        (name = "admin", description = "Operator login, company account management and maintenance"),
        (name = "files", description = "Signed downloads for locally stored documents")
    )
)]
pub struct ApiDoc;
