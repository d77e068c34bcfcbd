// Prints the OpenAPI document, including the error envelope schemas.
// Run with: cargo run --bin openapi_export > openapi.json

use error_envelope::api::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let json = ApiDoc::openapi().to_pretty_json()?;
    println!("{}", json);
    Ok(())
}
