use anyhow::Result;
use utoipa::openapi::ComponentsBuilder;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa_swagger_ui::SwaggerUi;

/// Mounts the swagger UI and registers the bearer scheme referenced by the
/// `security(("bearerAuth" = []))` route annotations.
pub fn create_swagger_ui(mut openapi: utoipa::openapi::OpenApi) -> Result<SwaggerUi> {
    let mut components = openapi
        .components
        .take()
        .unwrap_or_else(|| ComponentsBuilder::new().build());
    components.add_security_scheme(
        "bearerAuth",
        SecurityScheme::Http(
            HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .build(),
        ),
    );
    openapi.components = Some(components);

    Ok(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
}
