use buildable::Buildable;

#[buildable::builders]
mod config {
    use buildable::Builder;

    #[derive(Builder, Debug)]
    pub struct ServerConfig {
        pub host: String,
        pub port: u16,
        pub database: DatabaseConfig,
        pub cache: Option<CacheConfig>,
    }

    #[derive(Builder, Debug)]
    pub struct DatabaseConfig {
        pub connection_string: String,
        #[builder(default = 10)]
        pub max_connections: u32,
    }

    #[derive(Builder, Debug)]
    pub struct CacheConfig {
        pub capacity: usize,
        #[builder(default = 60)]
        pub ttl_secs: u64,
    }
}

use config::ServerConfig;

fn main() {
    println!("=== Nested Builders Example ===\n");

    let server = ServerConfig::build(|b| {
        b.host("0.0.0.0".to_string())
            .port(8080)
            .database_builder(|db| db.connection_string("postgresql://localhost/mydb".to_string()))
            .cache_builder(|c| c.capacity(1024))
    })
    .expect("Failed to build server config");
    println!("Server config: {:?}", server);

    // A failure inside the nested builder surfaces from the outer build
    let result = ServerConfig::build(|b| {
        b.host("0.0.0.0".to_string())
            .port(8080)
            .database_builder(|db| db.max_connections(5))
    });
    match result {
        Ok(server) => println!("\nUnexpectedly succeeded: {:?}", server),
        Err(e) => println!("\nExpected error from nested builder: {}", e),
    }
}
