use super::handlers::{auth, ekyc, health};
use utoipa::openapi::{
    security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Components, Contact, InfoBuilder, License, OpenApiBuilder, Tag,
};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// New endpoints go here via `.routes(routes!(...))` so they are both served
/// and documented. The 404 fallback is attached outside and stays undocumented.
pub(crate) fn api_router() -> OpenApiRouter {
    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::send_otp))
        .routes(routes!(auth::verify_otp))
        .routes(routes!(auth::logout))
        .routes(routes!(auth::me))
        .routes(routes!(ekyc::send_otp))
        .routes(routes!(ekyc::verify_otp));

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("One-time code login and sessions".to_string());

    let mut ekyc_tag = Tag::new("ekyc");
    ekyc_tag.description = Some("Aadhaar confirmation for signed-in users".to_string());

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Liveness".to_string());

    let openapi = router.get_openapi_mut();
    openapi.tags = Some(vec![auth_tag, ekyc_tag, health_tag]);

    let components = openapi.components.get_or_insert_with(Components::new);
    components.add_security_scheme(
        "bearer",
        SecurityScheme::Http(
            HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .build(),
        ),
    );
    components.add_security_scheme(
        "session_cookie",
        SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
    );

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).build()
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = match primary.find('<') {
        Some(start) => (
            primary[..start].trim(),
            primary[start + 1..].trim_end_matches('>').trim(),
        ),
        None => (primary, ""),
    };

    let mut contact = Contact::new();
    contact.name = optional_str(name).map(str::to_string);
    contact.email = optional_str(email).map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
