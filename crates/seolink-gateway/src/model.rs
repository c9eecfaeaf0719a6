mod redirect;

pub use redirect::{ErrorBody, HealthResponse, ListRedirectsResponse, PublicUrlResponse};
