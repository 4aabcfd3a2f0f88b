#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    school_reports::run().await
}
