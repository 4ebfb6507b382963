#[actix_web::main]
async fn main() -> std::io::Result<()> {
    estate_docs_server::run().await
}
