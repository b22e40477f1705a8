use log::{error, info};
use mongodb::{Client, Database};
use rocket::fairing::AdHoc;

pub type DbConn = Database;

pub fn init() -> AdHoc {
    AdHoc::on_ignite("MongoDB", |rocket| async {
        match connect().await {
            Ok((client, database)) => {
                info!("✓ MongoDB connected successfully");
                // The client is managed alongside the database so the
                // booking delete path can open a session transaction.
                rocket.manage(client).manage(database)
            }
            Err(e) => {
                error!("✗ Failed to connect to MongoDB: {}", e);
                rocket
            }
        }
    })
}

async fn connect() -> Result<(Client, Database), mongodb::error::Error> {
    let uri = crate::config::Config::mongodb_uri();
    let client = Client::with_uri_str(&uri).await?;

    // Test connection
    client
        .database("admin")
        .run_command(mongodb::bson::doc! {"ping": 1}, None)
        .await?;

    let database = client.database(&crate::config::Config::database_name());
    Ok((client, database))
}
