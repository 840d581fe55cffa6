//! OpenAPI/Utoipa configuration.

use crate::api::{CHALLENGE_TAG, health::MISC_TAG};
use utoipa::OpenApi;

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Identity Gate",
        version = "1.0.0",
        description = "Login, consent and logout pages for an OAuth2/OpenID Connect authorization server."
    ),
    tags(
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = CHALLENGE_TAG, description = "Login, consent and logout challenge handling")
    )
)]
pub struct ApiDoc;
